use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    sql::{
        engine::Database,
        executor::ResultSet,
        plan::Filter,
        schema::{Row, Table},
        types::Value,
    },
};

use super::{
    Executor,
    query::{check_column, row_matches},
};

/// INSERT executor
pub struct Insert {
    table_name: String,
    values: Vec<Value>,
}

impl Insert {
    pub fn new(table_name: String, values: Vec<Value>) -> Box<Self> {
        Box::new(Self { table_name, values })
    }
}

impl Executor for Insert {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet> {
        let table = db.must_get_table_mut(&self.table_name)?;
        // values are positional, no column list
        if self.values.len() != table.columns().len() {
            return Err(Error::Schema(format!(
                "table {} has {} columns but {} values were given",
                table.name,
                table.columns().len(),
                self.values.len()
            )));
        }
        let row = table.column_names().into_iter().zip(self.values).collect::<Row>();
        table.insert(row)?;
        Ok(ResultSet::Insert { count: 1 })
    }
}

/// Positions of the rows matching an optional filter
fn matching_positions(table: &Table, filter: Option<&Filter>) -> Result<Vec<usize>> {
    Ok(match filter {
        Some(filter) => {
            check_column(table, &filter.column)?;
            let predicate = |row: &Row| row_matches(filter, row);
            table.select_positions(Some(&predicate))
        }
        None => table.select_positions(None),
    })
}

/// Primary-key values of the rows matching an optional filter
fn matching_keys(table: &Table, pk: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
    let rows = table.rows();
    Ok(matching_positions(table, filter)?
        .into_iter()
        .map(|pos| rows[pos].get(pk).cloned().unwrap_or(Value::Null))
        .collect())
}

/// UPDATE executor
pub struct Update {
    table_name: String,
    filter: Option<Filter>,
    columns: BTreeMap<String, Value>,
}

impl Update {
    pub fn new(
        table_name: String,
        filter: Option<Filter>,
        columns: BTreeMap<String, Value>,
    ) -> Box<Self> {
        Box::new(Self {
            table_name,
            filter,
            columns,
        })
    }
}

impl Executor for Update {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet> {
        let table = db.must_get_table_mut(&self.table_name)?;
        let mut count = 0;
        match table.primary_key().map(str::to_string) {
            Some(pk) => {
                for key in matching_keys(table, &pk, self.filter.as_ref())? {
                    table.update(&key, &self.columns)?;
                    count += 1;
                }
            }
            // Positions are stable here: updates never move rows
            None => {
                for pos in matching_positions(table, self.filter.as_ref())? {
                    table.update_at(pos, &self.columns)?;
                    count += 1;
                }
            }
        }
        Ok(ResultSet::Update { count })
    }
}

/// DELETE executor
pub struct Delete {
    table_name: String,
    filter: Option<Filter>,
}

impl Delete {
    pub fn new(table_name: String, filter: Option<Filter>) -> Box<Self> {
        Box::new(Self { table_name, filter })
    }
}

impl Executor for Delete {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet> {
        let table = db.must_get_table_mut(&self.table_name)?;
        let Some(pk) = table.primary_key().map(str::to_string) else {
            return Err(Error::Schema(format!(
                "table {} has no primary key, rows cannot be deleted",
                table.name
            )));
        };

        let keys = matching_keys(table, &pk, self.filter.as_ref())?;
        for key in &keys {
            table.delete(key)?;
        }
        Ok(ResultSet::Delete { count: keys.len() })
    }
}
