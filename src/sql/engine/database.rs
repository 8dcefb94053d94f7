use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    sql::schema::Table,
};

/// In-memory catalog: table name to table
#[derive(Debug, Default)]
pub struct Database {
    tables: HashMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table, names are unique
    pub fn create_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(&table.name) {
            return Err(Error::Schema(format!("table {} already exists", table.name)));
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Returns the table, error if it doesn't exist
    pub fn must_get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::Schema(format!("table {} does not exist", name)))
    }

    pub fn must_get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::Schema(format!("table {} does not exist", name)))
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> Vec<String> {
        let mut names = self.tables.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}
