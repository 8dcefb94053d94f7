use crate::{
    error::{Error, Result},
    sql::{
        engine::Database,
        executor::ResultSet,
        plan::{ColumnRef, Filter},
        schema::{Row, Table},
        types::Value,
    },
};

use super::Executor;

/// Table scan executor (SELECT)
pub struct Scan {
    table_name: String,
    filter: Option<Filter>,
}

impl Scan {
    pub fn new(table_name: String, filter: Option<Filter>) -> Box<Self> {
        Box::new(Self { table_name, filter })
    }
}

impl Executor for Scan {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet> {
        let table = db.must_get_table(&self.table_name)?;
        let rows = match &self.filter {
            Some(filter) => {
                check_column(table, &filter.column)?;
                let predicate = |row: &Row| row_matches(filter, row);
                table.select_rows(Some(&predicate))
            }
            None => table.select_rows(None),
        };
        Ok(ResultSet::Scan {
            columns: table.column_names(),
            rows: rows.into_iter().map(|row| table.row_values(row)).collect(),
        })
    }
}

/// Projection executor - keeps the listed columns, in the listed order
pub struct Projection {
    source: Box<dyn Executor>,
    table_name: String,
    columns: Vec<ColumnRef>,
}

impl Projection {
    pub fn new(
        source: Box<dyn Executor>,
        table_name: String,
        columns: Vec<ColumnRef>,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            table_name,
            columns,
        })
    }
}

impl Executor for Projection {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet> {
        match self.source.execute(db)? {
            ResultSet::Scan { columns, rows } => {
                let mut positions = Vec::with_capacity(self.columns.len());
                for col in &self.columns {
                    check_qualifier(&self.table_name, col)?;
                    match columns.iter().position(|c| *c == col.name) {
                        Some(pos) => positions.push(pos),
                        None => {
                            return Err(Error::Schema(format!(
                                "column {} does not exist in table {}",
                                col.name, self.table_name
                            )));
                        }
                    }
                }

                Ok(ResultSet::Scan {
                    columns: positions.iter().map(|&i| columns[i].clone()).collect(),
                    rows: rows
                        .into_iter()
                        .map(|row| positions.iter().map(|&i| row[i].clone()).collect())
                        .collect(),
                })
            }
            _ => Err(Error::Unsupported("projection over a non-query source".into())),
        }
    }
}

/// A column referenced by a single-table statement must belong to that table
pub(super) fn check_column(table: &Table, col: &ColumnRef) -> Result<()> {
    check_qualifier(&table.name, col)?;
    if table.column(&col.name).is_none() {
        return Err(Error::Schema(format!(
            "column {} does not exist in table {}",
            col.name, table.name
        )));
    }
    Ok(())
}

fn check_qualifier(table_name: &str, col: &ColumnRef) -> Result<()> {
    match &col.table {
        Some(t) if t != table_name => Err(Error::Schema(format!(
            "table {} is not referenced by this statement",
            t
        ))),
        _ => Ok(()),
    }
}

/// Null stands in for a column the row does not hold
pub(super) fn row_matches(filter: &Filter, row: &Row) -> bool {
    filter.evaluate(row.get(&filter.column.name).unwrap_or(&Value::Null))
}
