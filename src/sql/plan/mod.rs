use std::{cmp::Ordering, collections::BTreeMap};

use crate::{
    error::Result,
    sql::{
        engine::Database,
        executor::{Executor, ResultSet},
        parser::ast::{self, Operator},
        schema::Table,
        types::Value,
    },
};

use planner::Planner;

mod planner;

/// Execution plan node
#[derive(Debug, PartialEq)]
pub enum Node {
    /// Register a new table
    CreateTable { schema: Table },
    /// Insert one row, values are positional over the table's columns
    Insert {
        table_name: String,
        values: Vec<Value>,
    },
    /// Full table scan with an optional filter
    Scan {
        table_name: String,
        filter: Option<Filter>,
    },
    /// Equality nested-loop join of two table scans
    NestedLoopJoin {
        left: Box<Node>,
        left_table: String,
        right: Box<Node>,
        right_table: String,
        on: (ColumnRef, ColumnRef),
        filter: Option<Filter>,
    },
    /// Select a subset of the source columns
    Projection {
        source: Box<Node>,
        table_name: String,
        columns: Vec<ColumnRef>,
    },
    Update {
        table_name: String,
        filter: Option<Filter>,
        columns: BTreeMap<String, Value>,
    },
    Delete {
        table_name: String,
        filter: Option<Filter>,
    },
}

/// A column reference, optionally qualified with a table name
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }
}

/// `column op literal`, the only predicate shape supported in WHERE
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: ColumnRef,
    pub operator: Operator,
    pub value: Value,
}

impl Filter {
    /// Evaluates the comparison against a row's column value
    ///
    /// `=` and `!=` use structural equality. Ordering operators only order
    /// Integer/Integer and Text/Text pairs; any other pair compares as
    /// equal, so `>`/`<` never match it and `>=`/`<=` always do.
    pub fn evaluate(&self, value: &Value) -> bool {
        let ordering = || value.order(&self.value).unwrap_or(Ordering::Equal);
        match self.operator {
            Operator::Equal => *value == self.value,
            Operator::NotEqual => *value != self.value,
            Operator::GreaterThan => ordering() == Ordering::Greater,
            Operator::LessThan => ordering() == Ordering::Less,
            Operator::GreaterThanOrEqual => ordering() != Ordering::Less,
            Operator::LessThanOrEqual => ordering() != Ordering::Greater,
        }
    }
}

/// Execution plan (wrapper around root node)
#[derive(Debug, PartialEq)]
pub struct Plan(pub Node);

impl Plan {
    /// Builds an execution plan from an AST statement
    pub fn build(stmt: ast::Statement) -> Result<Self> {
        Planner::new().build(stmt)
    }

    /// Builds the filter for an optional WHERE expression
    pub fn build_filter(expr: Option<ast::Expression>) -> Result<Option<Filter>> {
        Planner::new().build_filter(expr)
    }

    /// Executes the plan against the database
    pub fn execute(self, db: &mut Database) -> Result<ResultSet> {
        <dyn Executor>::build(self.0).execute(db)
    }

    /// Name of the table the plan writes to, None for queries
    pub fn mutated_table(&self) -> Option<&str> {
        match &self.0 {
            Node::CreateTable { schema } => Some(&schema.name),
            Node::Insert { table_name, .. }
            | Node::Update { table_name, .. }
            | Node::Delete { table_name, .. } => Some(table_name),
            Node::Scan { .. } | Node::NestedLoopJoin { .. } | Node::Projection { .. } => None,
        }
    }
}
