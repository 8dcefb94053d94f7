use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::{self, Expression, Operator},
        plan::{ColumnRef, Filter, Node, Plan},
        schema::{self, Table},
        types::Value,
    },
};

/// Query planner - converts AST into execution plan nodes
///
/// Shapes outside the supported subset (non-equality joins, projections
/// over a join, non-literal values) are rejected here, before any table
/// is touched.
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self {}
    }

    /// Builds an execution plan from an AST statement
    pub fn build(&mut self, stmt: ast::Statement) -> Result<Plan> {
        Ok(Plan(self.build_statement(stmt)?))
    }

    pub fn build_statement(&self, stmt: ast::Statement) -> Result<Node> {
        Ok(match stmt {
            ast::Statement::CreateTable { name, columns } => Node::CreateTable {
                schema: Table::new(
                    name,
                    columns
                        .into_iter()
                        .map(|c| schema::Column {
                            name: c.name,
                            datatype: c.datatype,
                            primary_key: c.primary_key,
                            unique: c.unique,
                        })
                        .collect(),
                )?,
            },
            ast::Statement::Insert { table_name, values } => Node::Insert {
                table_name,
                values: values
                    .into_iter()
                    .map(|e| self.build_value(e))
                    .collect::<Result<Vec<_>>>()?,
            },
            ast::Statement::Select {
                select,
                table_name,
                join,
                where_clause,
            } => self.build_select(select, table_name, join, where_clause)?,
            ast::Statement::Update {
                table_name,
                columns,
                where_clause,
            } => Node::Update {
                table_name,
                filter: self.build_filter(where_clause)?,
                columns: columns
                    .into_iter()
                    .map(|(col, expr)| -> Result<(String, Value)> {
                        Ok((col, self.build_value(expr)?))
                    })
                    .collect::<Result<_>>()?,
            },
            ast::Statement::Delete {
                table_name,
                where_clause,
            } => Node::Delete {
                table_name,
                filter: self.build_filter(where_clause)?,
            },
        })
    }

    fn build_select(
        &self,
        select: Vec<Expression>,
        table_name: String,
        join: Option<ast::Join>,
        where_clause: Option<Expression>,
    ) -> Result<Node> {
        let filter = self.build_filter(where_clause)?;
        let star = matches!(select.as_slice(), [Expression::Star]);

        let Some(join) = join else {
            let scan = Node::Scan {
                table_name: table_name.clone(),
                filter,
            };
            if star {
                return Ok(scan);
            }
            return Ok(Node::Projection {
                source: Box::new(scan),
                table_name,
                columns: select
                    .into_iter()
                    .map(|e| self.build_column(e))
                    .collect::<Result<Vec<_>>>()?,
            });
        };

        if !star {
            return Err(Error::Unsupported(
                "explicit column lists are only supported for single-table queries".into(),
            ));
        }

        let op = match join.predicate {
            Expression::Operation(op) => op,
            expr => {
                return Err(Error::Unsupported(format!(
                    "JOIN condition must be a comparison, got {}",
                    expr
                )));
            }
        };
        if op.operator != Operator::Equal {
            return Err(Error::Unsupported(format!(
                "only equality joins are supported, got {}",
                op.operator.to_str()
            )));
        }

        Ok(Node::NestedLoopJoin {
            left: Box::new(Node::Scan {
                table_name: table_name.clone(),
                filter: None,
            }),
            left_table: table_name,
            right: Box::new(Node::Scan {
                table_name: join.table_name.clone(),
                filter: None,
            }),
            right_table: join.table_name,
            on: (self.build_column(*op.left)?, self.build_column(*op.right)?),
            filter,
        })
    }

    /// Builds the filter for an optional WHERE expression
    ///
    /// Only `column op literal` is accepted.
    pub fn build_filter(&self, expr: Option<Expression>) -> Result<Option<Filter>> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        match expr {
            Expression::Operation(op) => Ok(Some(Filter {
                column: self.build_column(*op.left)?,
                operator: op.operator,
                value: self.build_value(*op.right)?,
            })),
            expr => Err(Error::Unsupported(format!(
                "WHERE clause must be a single comparison, got {}",
                expr
            ))),
        }
    }

    /// Only literals evaluate to values
    fn build_value(&self, expr: Expression) -> Result<Value> {
        match expr {
            Expression::Consts(c) => Ok(c.into()),
            Expression::Field(_) | Expression::QualifiedField(..) => Err(Error::Unsupported(
                format!("identifier {} is not allowed in a value position", expr),
            )),
            expr => Err(Error::Unsupported(format!(
                "expression {} is not allowed in a value position",
                expr
            ))),
        }
    }

    fn build_column(&self, expr: Expression) -> Result<ColumnRef> {
        match expr {
            Expression::Field(name) => Ok(ColumnRef { table: None, name }),
            Expression::QualifiedField(table, name) => Ok(ColumnRef {
                table: Some(table),
                name,
            }),
            expr => Err(Error::Unsupported(format!("expected a column reference, got {}", expr))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, Result},
        sql::{
            parser::{Parser, ast::Operator},
            plan::{ColumnRef, Filter, Node, Plan},
            types::Value,
        },
    };

    fn plan(sql: &str) -> Result<Plan> {
        Plan::build(Parser::new(sql).parse()?)
    }

    #[test]
    fn test_plan_select() -> Result<()> {
        assert_eq!(
            plan("SELECT * FROM users WHERE age > 25")?,
            Plan(Node::Scan {
                table_name: "users".to_string(),
                filter: Some(Filter {
                    column: ColumnRef::new("age"),
                    operator: Operator::GreaterThan,
                    value: Value::Integer(25),
                }),
            })
        );

        assert_eq!(
            plan("SELECT name, users.age FROM users")?,
            Plan(Node::Projection {
                source: Box::new(Node::Scan {
                    table_name: "users".to_string(),
                    filter: None,
                }),
                table_name: "users".to_string(),
                columns: vec![
                    ColumnRef::new("name"),
                    ColumnRef {
                        table: Some("users".to_string()),
                        name: "age".to_string(),
                    },
                ],
            })
        );
        Ok(())
    }

    #[test]
    fn test_plan_join() -> Result<()> {
        let Plan(node) = plan("SELECT * FROM a JOIN b ON a.id = b.a_id")?;
        let Node::NestedLoopJoin { on, filter, .. } = node else {
            panic!("expected join, got {:?}", node);
        };
        assert_eq!(on.0.table.as_deref(), Some("a"));
        assert_eq!(on.1.name, "a_id");
        assert_eq!(filter, None);
        Ok(())
    }

    #[test]
    fn test_plan_unsupported() {
        let cases = [
            "SELECT * FROM a JOIN b ON a.id > b.a_id",
            "SELECT a.id FROM a JOIN b ON a.id = b.a_id",
            "SELECT * FROM a JOIN b ON a.id = 3",
            "SELECT * FROM a WHERE id",
            "SELECT * FROM a WHERE id = other",
            "SELECT id = 1 FROM a",
            "INSERT INTO a VALUES (1, name)",
            "UPDATE a SET x = y",
        ];
        for sql in cases {
            assert!(
                matches!(plan(sql), Err(Error::Unsupported(_))),
                "expected unsupported for {}",
                sql
            );
        }
    }

    #[test]
    fn test_plan_create_table_schema_errors() {
        let dup = plan("CREATE TABLE t (a INTEGER, a TEXT)");
        assert!(matches!(dup, Err(Error::Schema(_))));
        let two_keys = plan("CREATE TABLE t (a INTEGER PRIMARY KEY, b INTEGER PRIMARY KEY)");
        assert!(matches!(two_keys, Err(Error::Schema(_))));
    }

    #[test]
    fn test_plan_mutated_table() -> Result<()> {
        assert_eq!(plan("INSERT INTO t VALUES (1)")?.mutated_table(), Some("t"));
        assert_eq!(plan("DELETE FROM t")?.mutated_table(), Some("t"));
        assert_eq!(plan("CREATE TABLE t (a TEXT)")?.mutated_table(), Some("t"));
        assert_eq!(plan("SELECT * FROM t")?.mutated_table(), None);
        Ok(())
    }
}
