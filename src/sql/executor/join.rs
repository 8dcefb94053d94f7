use crate::{
    error::{Error, Result},
    sql::{
        engine::Database,
        plan::{ColumnRef, Filter},
        types::Value,
    },
};

use super::{Executor, ResultSet};

/// Which input of the join a column comes from
#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Left = 0,
    Right = 1,
}

/// Nested Loop Join executor - equality join of two table scans
pub struct NestedLoopJoin {
    left: Box<dyn Executor>,
    left_table: String,
    right: Box<dyn Executor>,
    right_table: String,
    on: (ColumnRef, ColumnRef),
    filter: Option<Filter>,
}

impl NestedLoopJoin {
    pub fn new(
        left: Box<dyn Executor>,
        left_table: String,
        right: Box<dyn Executor>,
        right_table: String,
        on: (ColumnRef, ColumnRef),
        filter: Option<Filter>,
    ) -> Box<Self> {
        Box::new(Self {
            left,
            left_table,
            right,
            right_table,
            on,
            filter,
        })
    }
}

impl Executor for NestedLoopJoin {
    fn execute(self: Box<Self>, db: &mut Database) -> Result<ResultSet> {
        let Self {
            left,
            left_table,
            right,
            right_table,
            on,
            filter,
        } = *self;
        let ResultSet::Scan {
            columns: lcols,
            rows: lrows,
        } = left.execute(db)?
        else {
            return Err(Error::Unsupported("join over a non-query source".into()));
        };
        let ResultSet::Scan {
            columns: rcols,
            rows: rrows,
        } = right.execute(db)?
        else {
            return Err(Error::Unsupported("join over a non-query source".into()));
        };

        let sides = [
            (left_table.as_str(), lcols.as_slice()),
            (right_table.as_str(), rcols.as_slice()),
        ];
        let lkey = resolve(&on.0, Side::Left, sides)?;
        let rkey = resolve(&on.1, Side::Right, sides)?;
        let filter = match &filter {
            Some(f) => Some((f, resolve(&f.column, Side::Left, sides)?)),
            None => None,
        };

        let pick = |(side, i): (Side, usize), lrow: &[Value], rrow: &[Value]| -> Value {
            match side {
                Side::Left => lrow[i].clone(),
                Side::Right => rrow[i].clone(),
            }
        };

        let mut rows = Vec::new();
        for lrow in &lrows {
            for rrow in &rrows {
                if pick(lkey, lrow, rrow) != pick(rkey, lrow, rrow) {
                    continue;
                }
                if let Some((f, pos)) = filter {
                    if !f.evaluate(&pick(pos, lrow, rrow)) {
                        continue;
                    }
                }
                let mut row = lrow.clone();
                row.extend(rrow.iter().cloned());
                rows.push(row);
            }
        }

        let mut columns = lcols;
        columns.extend(rcols);
        Ok(ResultSet::Scan { columns, rows })
    }
}

/// Resolves a column to a side and a position within that side's rows
///
/// A qualifier picks the side by table name. An unqualified column is
/// looked up on `prefer` first, then on the other side.
fn resolve(col: &ColumnRef, prefer: Side, sides: [(&str, &[String]); 2]) -> Result<(Side, usize)> {
    let position = |side: Side| {
        let (_, cols) = sides[side as usize];
        cols.iter().position(|c| *c == col.name).map(|i| (side, i))
    };

    let found = match &col.table {
        Some(t) if t == sides[0].0 => position(Side::Left),
        Some(t) if t == sides[1].0 => position(Side::Right),
        Some(t) => {
            return Err(Error::Schema(format!(
                "table {} is not referenced by this statement",
                t
            )));
        }
        None => {
            let other = match prefer {
                Side::Left => Side::Right,
                Side::Right => Side::Left,
            };
            position(prefer).or_else(|| position(other))
        }
    };
    found.ok_or_else(|| {
        Error::Schema(format!(
            "column {} does not exist in table {} or {}",
            col.name, sides[0].0, sides[1].0
        ))
    })
}
