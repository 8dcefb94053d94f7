use std::{collections::BTreeMap, fmt::Display};

use crate::sql::types::{DataType, Value};

/// Abstract Syntax Tree (AST) node definitions for SQL statements
#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    /// CREATE TABLE statement
    CreateTable {
        name: String,
        columns: Vec<Column>,
    },
    /// INSERT statement, values are positional over the table's columns
    Insert {
        table_name: String,
        values: Vec<Expression>,
    },
    /// SELECT statement
    Select {
        select: Vec<Expression>,
        table_name: String,
        join: Option<Join>,
        where_clause: Option<Expression>,
    },
    /// UPDATE statement
    Update {
        table_name: String,
        columns: BTreeMap<String, Expression>,
        where_clause: Option<Expression>,
    },
    /// DELETE statement
    Delete {
        table_name: String,
        where_clause: Option<Expression>,
    },
}

/// Column definition for CREATE TABLE statements
#[derive(Debug, PartialEq, Clone)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub primary_key: bool,
    pub unique: bool,
}

/// `JOIN table ON left = right`
#[derive(Debug, PartialEq, Clone)]
pub struct Join {
    pub table_name: String,
    pub predicate: Expression,
}

/// Expression types (column refs, literals, comparisons)
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// Plain column reference
    Field(String),
    /// `table.column` reference
    QualifiedField(String, String),
    /// Literal value
    Consts(Consts),
    /// Single binary comparison
    Operation(Operation),
    /// `*` in a projection list
    Star,
}

/// Implements From trait to convert Consts into Expression
impl From<Consts> for Expression {
    fn from(value: Consts) -> Self {
        Self::Consts(value)
    }
}

impl From<Operation> for Expression {
    fn from(value: Operation) -> Self {
        Self::Operation(value)
    }
}

/// Literal values in SQL expressions
#[derive(Debug, PartialEq, Clone)]
pub enum Consts {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl From<Consts> for Value {
    fn from(value: Consts) -> Self {
        match value {
            Consts::Boolean(b) => Value::Boolean(b),
            Consts::Integer(i) => Value::Integer(i),
            Consts::String(s) => Value::Text(s),
        }
    }
}

/// Comparison operator
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl Operator {
    pub fn to_str(&self) -> &str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
        }
    }
}

/// Binary comparison `left op right`
#[derive(Debug, PartialEq, Clone)]
pub struct Operation {
    pub left: Box<Expression>,
    pub operator: Operator,
    pub right: Box<Expression>,
}

impl Operation {
    pub fn new(left: Expression, operator: Operator, right: Expression) -> Self {
        Self {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::CreateTable { name, columns } => {
                write!(f, "CREATE TABLE {} (", name)?;
                write_list(f, columns)?;
                write!(f, ")")
            }
            Statement::Insert { table_name, values } => {
                write!(f, "INSERT INTO {} VALUES (", table_name)?;
                write_list(f, values)?;
                write!(f, ")")
            }
            Statement::Select {
                select,
                table_name,
                join,
                where_clause,
            } => {
                write!(f, "SELECT ")?;
                write_list(f, select)?;
                write!(f, " FROM {}", table_name)?;
                if let Some(join) = join {
                    write!(f, " {}", join)?;
                }
                write_where(f, where_clause)
            }
            Statement::Update {
                table_name,
                columns,
                where_clause,
            } => {
                write!(f, "UPDATE {} SET ", table_name)?;
                for (i, (col, expr)) in columns.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", col, expr)?;
                }
                write_where(f, where_clause)
            }
            Statement::Delete {
                table_name,
                where_clause,
            } => {
                write!(f, "DELETE FROM {}", table_name)?;
                write_where(f, where_clause)
            }
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.datatype)?;
        if self.primary_key {
            write!(f, " PRIMARY KEY")?;
        }
        if self.unique {
            write!(f, " UNIQUE")?;
        }
        Ok(())
    }
}

impl Display for Join {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JOIN {} ON {}", self.table_name, self.predicate)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Field(name) => f.write_str(name),
            Expression::QualifiedField(table, name) => write!(f, "{}.{}", table, name),
            Expression::Consts(c) => write!(f, "{}", c),
            Expression::Operation(op) => write!(f, "{}", op),
            Expression::Star => f.write_str("*"),
        }
    }
}

impl Display for Consts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Consts::Boolean(true) => f.write_str("TRUE"),
            Consts::Boolean(false) => f.write_str("FALSE"),
            Consts::Integer(i) => write!(f, "{}", i),
            Consts::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator.to_str(), self.right)
    }
}

fn write_list<T: Display>(f: &mut std::fmt::Formatter<'_>, items: &[T]) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_where(
    f: &mut std::fmt::Formatter<'_>,
    where_clause: &Option<Expression>,
) -> std::fmt::Result {
    match where_clause {
        Some(expr) => write!(f, " WHERE {}", expr),
        None => Ok(()),
    }
}
