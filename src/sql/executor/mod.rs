use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    sql::{
        engine::Database,
        executor::{
            join::NestedLoopJoin,
            mutation::{Delete, Insert, Update},
            query::{Projection, Scan},
            schema::CreateTable,
        },
        plan::Node,
        types::Value,
    },
};

mod join;
mod mutation;
mod query;
mod schema;

/// SQL executor trait
pub trait Executor {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet>;
}

/// Builds an executor from a plan node
impl dyn Executor {
    pub fn build(node: Node) -> Box<dyn Executor> {
        match node {
            Node::CreateTable { schema } => CreateTable::new(schema),
            Node::Insert { table_name, values } => Insert::new(table_name, values),
            Node::Scan { table_name, filter } => Scan::new(table_name, filter),
            Node::NestedLoopJoin {
                left,
                left_table,
                right,
                right_table,
                on,
                filter,
            } => NestedLoopJoin::new(
                Self::build(*left),
                left_table,
                Self::build(*right),
                right_table,
                on,
                filter,
            ),
            Node::Projection {
                source,
                table_name,
                columns,
            } => Projection::new(Self::build(*source), table_name, columns),
            Node::Update {
                table_name,
                filter,
                columns,
            } => Update::new(table_name, filter, columns),
            Node::Delete { table_name, filter } => Delete::new(table_name, filter),
        }
    }
}

/// Execution result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultSet {
    CreateTable { table_name: String },
    Insert { count: usize },
    Scan { columns: Vec<String>, rows: Vec<Vec<Value>> },
    Update { count: usize },
    Delete { count: usize },
}

/// Tab-separated rendering for shells; Null prints as `NULL`, empty text as nothing
impl Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSet::CreateTable { table_name } => {
                write!(f, "Table {} created successfully", table_name)
            }
            ResultSet::Insert { count } => write!(f, "{} row(s) inserted", count),
            ResultSet::Update { count } => write!(f, "{} row(s) updated", count),
            ResultSet::Delete { count } => write!(f, "{} row(s) deleted", count),
            ResultSet::Scan { rows, .. } if rows.is_empty() => write!(f, "No results"),
            ResultSet::Scan { columns, rows } => {
                writeln!(f, "{}", columns.join("\t"))?;
                writeln!(f, "{}", vec!["--------"; columns.len()].join("\t"))?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    let cells = row.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                    write!(f, "{}", cells.join("\t"))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResultSet;
    use crate::sql::types::Value;

    #[test]
    fn test_result_set_display() {
        let rs = ResultSet::Scan {
            columns: vec!["id".to_string(), "name".to_string(), "nick".to_string()],
            rows: vec![
                vec![Value::Integer(1), Value::from("Alice"), Value::Null],
                vec![Value::Integer(2), Value::from(""), Value::Boolean(true)],
            ],
        };
        assert_eq!(
            rs.to_string(),
            "id\tname\tnick\n--------\t--------\t--------\n1\tAlice\tNULL\n2\t\tTRUE"
        );

        let empty = ResultSet::Scan {
            columns: vec!["id".to_string()],
            rows: vec![],
        };
        assert_eq!(empty.to_string(), "No results");
        assert_eq!(ResultSet::Delete { count: 2 }.to_string(), "2 row(s) deleted");
    }
}
