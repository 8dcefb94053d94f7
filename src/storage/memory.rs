use std::collections::BTreeMap;

use crate::{
    error::Result,
    sql::schema::Table,
    storage::{Storage, codec},
};

/// In-memory storage, keeps the encoded text of each table
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoded contents last saved for a table
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn load_tables(&mut self) -> Result<Vec<Table>> {
        self.files
            .iter()
            .map(|(name, data)| codec::decode(name, data))
            .collect()
    }

    fn save_table(&mut self, table: &Table) -> Result<()> {
        self.files.insert(table.name.clone(), codec::encode(table));
        Ok(())
    }
}
