use crate::{
    error::Result,
    sql::{engine::Database, schema::Table},
};

use super::{Executor, ResultSet};

/// CREATE TABLE executor
pub struct CreateTable {
    schema: Table,
}

impl CreateTable {
    pub fn new(schema: Table) -> Box<Self> {
        Box::new(Self { schema })
    }
}

impl Executor for CreateTable {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet> {
        let table_name = self.schema.name.clone();
        db.create_table(self.schema)?;
        Ok(ResultSet::CreateTable { table_name })
    }
}
