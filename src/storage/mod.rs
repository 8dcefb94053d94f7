use crate::{error::Result, sql::schema::Table};

pub mod codec;
pub mod file;
pub mod memory;

/// Whole-table persistence interface
///
/// Different from sql::engine::Database which holds the live tables; a
/// storage only sees tables at load time and after each mutation.
pub trait Storage {
    /// Loads every stored table
    fn load_tables(&mut self) -> Result<Vec<Table>>;

    /// Replaces the stored copy of a table with its current contents
    fn save_table(&mut self, table: &Table) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::{Storage, file::FileStorage, memory::MemoryStorage};
    use crate::{
        config::Config,
        error::Result,
        sql::{
            schema::{Column, Row, Table},
            types::{DataType, Value},
        },
    };

    fn table(name: &str, ids: &[i64]) -> Result<Table> {
        let mut table = Table::new(
            name,
            vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("label", DataType::Text),
            ],
        )?;
        for id in ids {
            table.insert(Row::from_iter([
                ("id".to_string(), Value::Integer(*id)),
                ("label".to_string(), Value::from(format!("row {}", id))),
            ]))?;
        }
        Ok(table)
    }

    fn test_save_load(mut storage: impl Storage) -> Result<()> {
        assert!(storage.load_tables()?.is_empty());

        storage.save_table(&table("b", &[1, 2])?)?;
        storage.save_table(&table("a", &[])?)?;
        // saving again replaces the previous contents
        storage.save_table(&table("b", &[3])?)?;

        let tables = storage.load_tables()?;
        let names = tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b"]);
        assert!(tables[0].is_empty());
        assert_eq!(tables[1].rows(), table("b", &[3])?.rows());
        Ok(())
    }

    #[test]
    fn test_memory() -> Result<()> {
        test_save_load(MemoryStorage::new())?;
        Ok(())
    }

    #[test]
    fn test_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        test_save_load(FileStorage::new(&Config::new(dir.path().join("atomic")))?)?;
        test_save_load(FileStorage::new(
            &Config::new(dir.path().join("in_place")).with_atomic_writes(false),
        )?)?;
        Ok(())
    }
}
