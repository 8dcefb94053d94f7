use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use crate::{
    config::Config,
    error::Result,
    sql::{
        executor::ResultSet,
        parser::{
            Parser,
            ast::{self, Expression},
        },
        plan::{Node, Plan},
        schema::{Column, Table},
        types::Value,
    },
    storage::{Storage, file::FileStorage},
};

mod database;

pub use database::Database;

/// SQL engine: the live tables plus the storage they are persisted to
///
/// Every successful mutating statement rewrites the affected table through
/// the storage before returning. Methods take `&mut self`; an embedder that
/// shares an engine across threads must serialize access itself.
pub struct Engine<S: Storage> {
    db: Database,
    storage: S,
}

impl Engine<FileStorage> {
    /// Opens the data directory named by the config and loads every table in it
    pub fn open(config: &Config) -> Result<Self> {
        Self::with_storage(FileStorage::new(config)?)
    }
}

impl<S: Storage> Engine<S> {
    pub fn with_storage(mut storage: S) -> Result<Self> {
        let mut db = Database::new();
        for table in storage.load_tables()? {
            debug!(table = %table.name, rows = table.len(), "loaded table");
            db.create_table(table)?;
        }
        info!(tables = db.table_names().len(), "engine ready");
        Ok(Self { db, storage })
    }

    /// Executes a single SQL statement
    #[instrument(skip(self))]
    pub fn execute(&mut self, sql: &str) -> Result<ResultSet> {
        let stmt = Parser::new(sql).parse()?;
        self.run(Plan::build(stmt)?)
    }

    /// Registers a new table
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        let schema = Table::new(name, columns)?;
        self.run(Plan(Node::CreateTable { schema }))?;
        Ok(())
    }

    /// Inserts one row; values are positional over the table's columns
    pub fn insert(&mut self, table: &str, values: Vec<Value>) -> Result<()> {
        self.run(Plan(Node::Insert {
            table_name: table.to_string(),
            values,
        }))?;
        Ok(())
    }

    /// Runs a query
    ///
    /// An empty projection selects every column. The predicate and the join
    /// condition take the same shapes as their SQL counterparts.
    pub fn select(
        &mut self,
        table: &str,
        projection: Vec<Expression>,
        predicate: Option<Expression>,
        join: Option<ast::Join>,
    ) -> Result<ResultSet> {
        let select = if projection.is_empty() {
            vec![Expression::Star]
        } else {
            projection
        };
        self.run(Plan::build(ast::Statement::Select {
            select,
            table_name: table.to_string(),
            join,
            where_clause: predicate,
        })?)
    }

    /// Updates every row matching the predicate (all rows when None)
    pub fn update(
        &mut self,
        table: &str,
        assignments: BTreeMap<String, Value>,
        predicate: Option<Expression>,
    ) -> Result<()> {
        self.run(Plan(Node::Update {
            table_name: table.to_string(),
            filter: Plan::build_filter(predicate)?,
            columns: assignments,
        }))?;
        Ok(())
    }

    /// Deletes every row matching the predicate (all rows when None)
    pub fn delete(&mut self, table: &str, predicate: Option<Expression>) -> Result<()> {
        self.run(Plan(Node::Delete {
            table_name: table.to_string(),
            filter: Plan::build_filter(predicate)?,
        }))?;
        Ok(())
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> Vec<String> {
        self.db.table_names()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.db.get_table(name)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Executes a plan and persists the table it mutated
    fn run(&mut self, plan: Plan) -> Result<ResultSet> {
        let mutated = plan.mutated_table().map(str::to_string);
        let result = plan.execute(&mut self.db)?;
        if let Some(name) = mutated {
            let table = self.db.must_get_table(&name)?;
            self.storage.save_table(table)?;
            debug!(table = %name, "persisted table");
        }
        Ok(result)
    }
}
