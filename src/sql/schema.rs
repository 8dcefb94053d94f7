use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql::types::{DataType, Value},
};

/// Column schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    /// Whether this column is the primary key
    pub primary_key: bool,
    /// Whether non-null values must be distinct across rows
    pub unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            datatype,
            primary_key: false,
            unique: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A row maps column names to values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A table: schema, rows in insertion order and a primary-key index
///
/// The index maps a primary-key value to the row's position in `rows`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    primary_key: Option<String>,
    index: HashMap<Value, usize>,
}

impl Table {
    /// Creates an empty table after validating the schema
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        check_identifier("table", &name)?;
        if columns.is_empty() {
            return Err(Error::Schema(format!("table {} has no columns", name)));
        }

        let mut seen = HashSet::new();
        for col in &columns {
            check_identifier("column", &col.name)?;
            if !seen.insert(col.name.as_str()) {
                return Err(Error::Schema(format!(
                    "duplicate column {} in table {}",
                    col.name, name
                )));
            }
        }

        let mut keys = columns.iter().filter(|c| c.primary_key);
        let primary_key = keys.next().map(|c| c.name.clone());
        if keys.next().is_some() {
            return Err(Error::Schema(format!("multiple primary keys for table {}", name)));
        }

        Ok(Self {
            name,
            columns,
            rows: Vec::new(),
            primary_key,
            index: HashMap::new(),
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Name of the primary-key column, if one is declared
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row's values in column declaration order
    pub fn row_values(&self, row: &Row) -> Vec<Value> {
        self.columns
            .iter()
            .map(|c| row.get(&c.name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Validates and appends a row
    ///
    /// Every declared column needs a value (possibly Null) and no other
    /// column may be present.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        if let Some(col) = row.columns().find(|c| self.column(c).is_none()) {
            return Err(Error::Schema(format!(
                "column {} does not exist in table {}",
                col, self.name
            )));
        }

        for col in &self.columns {
            match row.get(&col.name) {
                Some(value) => validate_value(col, value)?,
                None => {
                    return Err(Error::Schema(format!("missing value for column {}", col.name)));
                }
            }
        }

        let key = match &self.primary_key {
            Some(pk) => {
                let key = row.get(pk).cloned().unwrap_or(Value::Null);
                self.check_key(pk, &key)?;
                Some(key)
            }
            None => None,
        };

        for col in self.columns.iter().filter(|c| c.unique && !c.primary_key) {
            if let Some(value) = row.get(&col.name) {
                self.check_unique(col, value, None)?;
            }
        }

        self.rows.push(row);
        if let Some(key) = key {
            self.index.insert(key, self.rows.len() - 1);
        }
        Ok(())
    }

    /// O(1) lookup through the primary-key index
    pub fn find_by_primary_key(&self, value: &Value) -> Option<&Row> {
        self.primary_key.as_ref()?;
        self.index.get(value).map(|&pos| &self.rows[pos])
    }

    /// Updates the row identified by a primary-key value
    pub fn update(&mut self, key: &Value, updates: &BTreeMap<String, Value>) -> Result<()> {
        let pos = match self.index.get(key) {
            Some(&pos) if self.primary_key.is_some() => pos,
            _ => {
                return Err(Error::NotFound(format!(
                    "row with primary key {} not found in table {}",
                    key, self.name
                )));
            }
        };
        self.update_at(pos, updates)
    }

    /// Updates the row at a position in insertion order
    ///
    /// All columns are type-checked before anything is written. If a unique
    /// constraint fails after the values are applied, the row's previous
    /// values are restored. Changing the primary key moves its index entry.
    pub fn update_at(&mut self, pos: usize, updates: &BTreeMap<String, Value>) -> Result<()> {
        if pos >= self.rows.len() {
            return Err(Error::NotFound(format!(
                "row {} not found in table {}",
                pos, self.name
            )));
        }

        for (name, value) in updates {
            match self.column(name) {
                Some(col) => validate_value(col, value)?,
                None => {
                    return Err(Error::Schema(format!(
                        "column {} does not exist in table {}",
                        name, self.name
                    )));
                }
            }
        }

        let rekey = match &self.primary_key {
            Some(pk) => match updates.get(pk) {
                Some(new_key) => {
                    let old_key = self.rows[pos].get(pk).cloned().unwrap_or(Value::Null);
                    if *new_key == old_key {
                        None
                    } else {
                        self.check_key(pk, new_key)?;
                        Some((old_key, new_key.clone()))
                    }
                }
                None => None,
            },
            None => None,
        };

        let previous = self.rows[pos].clone();
        for (name, value) in updates {
            self.rows[pos].set(name.clone(), value.clone());
        }

        for col in self.columns.iter().filter(|c| c.unique && !c.primary_key) {
            let value = self.rows[pos].get(&col.name).cloned().unwrap_or(Value::Null);
            if let Err(err) = self.check_unique(col, &value, Some(pos)) {
                self.rows[pos] = previous;
                return Err(err);
            }
        }

        if let Some((old_key, new_key)) = rekey {
            self.index.remove(&old_key);
            self.index.insert(new_key, pos);
        }
        Ok(())
    }

    /// Removes the row identified by a primary-key value and returns it
    pub fn delete(&mut self, key: &Value) -> Result<Row> {
        if self.primary_key.is_none() {
            return Err(Error::Schema(format!(
                "table {} has no primary key, rows cannot be deleted",
                self.name
            )));
        }
        let pos = self.index.remove(key).ok_or_else(|| {
            Error::NotFound(format!(
                "row with primary key {} not found in table {}",
                key, self.name
            ))
        })?;

        let row = self.rows.remove(pos);
        for p in self.index.values_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        Ok(row)
    }

    /// Rows satisfying the predicate, in insertion order (None means all)
    pub fn select_rows(&self, predicate: Option<&dyn Fn(&Row) -> bool>) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|row| predicate.is_none_or(|p| p(*row)))
            .collect()
    }

    /// Positions of the rows satisfying the predicate
    pub fn select_positions(&self, predicate: Option<&dyn Fn(&Row) -> bool>) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| predicate.is_none_or(|p| p(*row)))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// A primary key must be non-null and not already indexed
    fn check_key(&self, pk: &str, key: &Value) -> Result<()> {
        if key.is_null() {
            return Err(Error::Constraint(format!(
                "primary key {} of table {} cannot be null",
                pk, self.name
            )));
        }
        if self.index.contains_key(key) {
            return Err(Error::Constraint(format!(
                "primary key violation: {} already exists in table {}",
                key, self.name
            )));
        }
        Ok(())
    }

    /// Linear scan for another row holding the same non-null value
    fn check_unique(&self, col: &Column, value: &Value, skip: Option<usize>) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let duplicate = self
            .rows
            .iter()
            .enumerate()
            .filter(|(pos, _)| Some(*pos) != skip)
            .any(|(_, row)| row.get(&col.name) == Some(value));
        if duplicate {
            return Err(Error::Constraint(format!(
                "unique constraint violation for column {}: {} already exists",
                col.name, value
            )));
        }
        Ok(())
    }
}

/// Names follow the SQL identifier rule: a letter or `_`, then letters,
/// digits or `_`. They appear in file names and in the table file header.
fn check_identifier(kind: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::Schema(format!("invalid {} name {:?}", kind, name)));
    }
    Ok(())
}

/// A non-null value must match the column's declared type
fn validate_value(col: &Column, value: &Value) -> Result<()> {
    match value.datatype() {
        None => Ok(()),
        Some(dt) if dt == col.datatype => Ok(()),
        Some(dt) => Err(Error::Schema(format!(
            "column {} expects {}, got {}",
            col.name, col.datatype, dt
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{Column, Row, Table};
    use crate::{
        error::{Error, Result},
        sql::types::{DataType, Value},
    };

    fn users() -> Result<Table> {
        Table::new(
            "users",
            vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("name", DataType::Text),
                Column::new("email", DataType::Text).unique(),
            ],
        )
    }

    fn user(id: i64, name: &str, email: Value) -> Row {
        Row::from_iter([
            ("id".to_string(), Value::Integer(id)),
            ("name".to_string(), Value::from(name)),
            ("email".to_string(), email),
        ])
    }

    #[test]
    fn test_table_schema_validation() {
        assert!(matches!(Table::new("t", vec![]), Err(Error::Schema(_))));
        assert!(matches!(
            Table::new(
                "t",
                vec![
                    Column::new("a", DataType::Integer),
                    Column::new("a", DataType::Text)
                ]
            ),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            Table::new(
                "t",
                vec![
                    Column::new("a", DataType::Integer).primary_key(),
                    Column::new("b", DataType::Integer).primary_key()
                ]
            ),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_table_name_validation() -> Result<()> {
        let column = || vec![Column::new("a", DataType::Integer)];
        for name in ["", "../escape", "dir/t", "t.table", "1st", "my-table", "a b"] {
            assert!(
                matches!(Table::new(name, column()), Err(Error::Schema(_))),
                "table name {:?} accepted",
                name
            );
        }
        for name in ["a:b", "a,b", "", "x\ny", "\"q\""] {
            let columns = vec![Column::new(name, DataType::Text)];
            assert!(
                matches!(Table::new("t", columns), Err(Error::Schema(_))),
                "column name {:?} accepted",
                name
            );
        }

        Table::new("_users_2", vec![Column::new("_id9", DataType::Integer)])?;
        Ok(())
    }

    #[test]
    fn test_insert_validation() -> Result<()> {
        let mut table = users()?;

        let mut missing = Row::new();
        missing.set("id", Value::Integer(1));
        assert!(matches!(table.insert(missing), Err(Error::Schema(_))));

        let wrong_type = Row::from_iter([
            ("id".to_string(), Value::from("1")),
            ("name".to_string(), Value::from("a")),
            ("email".to_string(), Value::Null),
        ]);
        assert!(matches!(table.insert(wrong_type), Err(Error::Schema(_))));

        let mut extra = user(1, "a", Value::Null);
        extra.set("age", Value::Integer(3));
        assert!(matches!(table.insert(extra), Err(Error::Schema(_))));

        assert!(matches!(
            table.insert(Row::from_iter([
                ("id".to_string(), Value::Null),
                ("name".to_string(), Value::from("a")),
                ("email".to_string(), Value::Null),
            ])),
            Err(Error::Constraint(_))
        ));

        assert!(table.is_empty());
        Ok(())
    }

    #[test]
    fn test_primary_key_uniqueness() -> Result<()> {
        let mut table = users()?;
        table.insert(user(1, "Alice", Value::Null))?;
        let result = table.insert(user(1, "Bob", Value::Null));
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[test]
    fn test_unique_nulls_exempt() -> Result<()> {
        let mut table = users()?;
        table.insert(user(1, "a", Value::Null))?;
        table.insert(user(2, "b", Value::Null))?;
        table.insert(user(3, "c", Value::from("c@x.io")))?;
        let result = table.insert(user(4, "d", Value::from("c@x.io")));
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(table.len(), 3);
        Ok(())
    }

    #[test]
    fn test_index_consistency() -> Result<()> {
        let mut table = users()?;
        for id in 1..=5 {
            table.insert(user(id, &format!("u{}", id), Value::Null))?;
            let row = table.find_by_primary_key(&Value::Integer(id));
            assert_eq!(row.and_then(|r| r.get("id")), Some(&Value::Integer(id)));
        }

        let removed = table.delete(&Value::Integer(2))?;
        assert_eq!(removed.get("name"), Some(&Value::from("u2")));
        assert!(table.find_by_primary_key(&Value::Integer(2)).is_none());

        // positions after the removed row still resolve to the right rows
        for id in [1, 3, 4, 5] {
            let row = table.find_by_primary_key(&Value::Integer(id));
            assert_eq!(row.and_then(|r| r.get("id")), Some(&Value::Integer(id)));
        }

        assert!(matches!(table.delete(&Value::Integer(2)), Err(Error::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_delete_requires_primary_key() -> Result<()> {
        let mut table = Table::new("logs", vec![Column::new("msg", DataType::Text)])?;
        table.insert(Row::from_iter([("msg".to_string(), Value::from("hi"))]))?;
        assert!(table.find_by_primary_key(&Value::from("hi")).is_none());
        assert!(matches!(table.delete(&Value::from("hi")), Err(Error::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_update() -> Result<()> {
        let mut table = users()?;
        table.insert(user(1, "a", Value::from("a@x.io")))?;
        table.insert(user(2, "b", Value::from("b@x.io")))?;

        let mut updates = BTreeMap::new();
        updates.insert("name".to_string(), Value::from("alice"));
        table.update(&Value::Integer(1), &updates)?;
        assert_eq!(
            table.find_by_primary_key(&Value::Integer(1)).and_then(|r| r.get("name")),
            Some(&Value::from("alice"))
        );

        assert!(matches!(table.update(&Value::Integer(9), &updates), Err(Error::NotFound(_))));

        let mut unknown = BTreeMap::new();
        unknown.insert("age".to_string(), Value::Integer(3));
        assert!(matches!(table.update(&Value::Integer(1), &unknown), Err(Error::Schema(_))));

        let mut wrong_type = BTreeMap::new();
        wrong_type.insert("name".to_string(), Value::Integer(3));
        assert!(matches!(table.update(&Value::Integer(1), &wrong_type), Err(Error::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_update_unique_violation_restores_row() -> Result<()> {
        let mut table = users()?;
        table.insert(user(1, "a", Value::from("a@x.io")))?;
        table.insert(user(2, "b", Value::from("b@x.io")))?;

        let mut updates = BTreeMap::new();
        updates.insert("name".to_string(), Value::from("bee"));
        updates.insert("email".to_string(), Value::from("a@x.io"));
        let result = table.update(&Value::Integer(2), &updates);
        assert!(matches!(result, Err(Error::Constraint(_))));

        let row = table.find_by_primary_key(&Value::Integer(2));
        assert_eq!(row, Some(&user(2, "b", Value::from("b@x.io"))));

        // setting a unique column to its own current value is fine
        let mut same = BTreeMap::new();
        same.insert("email".to_string(), Value::from("b@x.io"));
        table.update(&Value::Integer(2), &same)?;
        Ok(())
    }

    #[test]
    fn test_update_primary_key_reindexes() -> Result<()> {
        let mut table = users()?;
        table.insert(user(1, "a", Value::Null))?;
        table.insert(user(2, "b", Value::Null))?;

        let mut updates = BTreeMap::new();
        updates.insert("id".to_string(), Value::Integer(10));
        table.update(&Value::Integer(1), &updates)?;
        assert!(table.find_by_primary_key(&Value::Integer(1)).is_none());
        assert_eq!(
            table.find_by_primary_key(&Value::Integer(10)).and_then(|r| r.get("name")),
            Some(&Value::from("a"))
        );

        let mut collide = BTreeMap::new();
        collide.insert("id".to_string(), Value::Integer(2));
        let result = table.update(&Value::Integer(10), &collide);
        assert!(matches!(result, Err(Error::Constraint(_))));

        let mut null = BTreeMap::new();
        null.insert("id".to_string(), Value::Null);
        let result = table.update(&Value::Integer(10), &null);
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert!(table.find_by_primary_key(&Value::Integer(10)).is_some());
        Ok(())
    }

    #[test]
    fn test_select_rows() -> Result<()> {
        let mut table = users()?;
        for id in 1..=4 {
            table.insert(user(id, "n", Value::Null))?;
        }
        assert_eq!(table.select_rows(None).len(), 4);

        let even = |row: &Row| matches!(row.get("id"), Some(Value::Integer(i)) if i % 2 == 0);
        let rows = table.select_rows(Some(&even));
        let ids = rows.iter().map(|r| r.get("id").cloned()).collect::<Vec<_>>();
        assert_eq!(ids, vec![Some(Value::Integer(2)), Some(Value::Integer(4))]);
        assert_eq!(table.select_positions(Some(&even)), vec![1, 3]);
        Ok(())
    }
}
