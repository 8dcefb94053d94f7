//! Line-oriented text format for a single table.
//!
//! ```text
//! # SCHEMA: id:INTEGER:PRIMARY_KEY,name:TEXT,email:TEXT:UNIQUE,active:BOOLEAN
//! 1,Alice,alice@example.com,true
//! 2,"Smith, Bob",,false
//! ```
//!
//! Every line ends with `\n`. Fields are comma-separated in column
//! declaration order. Null is an empty unquoted field, so in a one-column
//! table a Null row is an empty line. Text is wrapped in double quotes (with
//! `"` doubled) when it would not otherwise read back unchanged.

use std::iter::Peekable;
use std::str::Chars;

use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::{
        schema::{Column, Row, Table},
        types::{DataType, Value},
    },
};

const SCHEMA_PREFIX: &str = "# SCHEMA: ";
const PRIMARY_KEY: &str = "PRIMARY_KEY";
const UNIQUE: &str = "UNIQUE";

/// Serializes a table: schema header, then one `\n`-terminated line per row
pub fn encode(table: &Table) -> String {
    let header = table
        .columns()
        .iter()
        .map(|col| {
            let mut def = format!("{}:{}", col.name, col.datatype.to_str());
            if col.primary_key {
                def.push(':');
                def.push_str(PRIMARY_KEY);
            }
            if col.unique {
                def.push(':');
                def.push_str(UNIQUE);
            }
            def
        })
        .collect::<Vec<_>>()
        .join(",");

    let mut out = String::from(SCHEMA_PREFIX);
    out.push_str(&header);
    out.push('\n');
    for row in table.rows() {
        let fields = table
            .row_values(row)
            .iter()
            .map(encode_value)
            .collect::<Vec<_>>();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Text(s) if needs_quotes(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        Value::Text(s) => s.clone(),
    }
}

/// Text that an unquoted field would not reproduce exactly
fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.trim() != s || s.contains([',', '"', '\n', '\r'])
}

/// Parses a table file body back into a table
///
/// Rows go through `Table::insert`, so constraints are checked again.
pub fn decode(name: &str, data: &str) -> Result<Table> {
    let (header, body) = match data.split_once('\n') {
        Some((header, body)) => (header, body),
        None => (data, ""),
    };
    let columns = decode_header(header.trim_end_matches('\r'))?;
    let mut table = Table::new(name, columns)
        .map_err(|err| Error::Io(format!("invalid schema in table file {}: {}", name, err)))?;

    let width = table.columns().len();
    for (i, record) in Records::new(body).enumerate() {
        // a blank line is a Null row in a one-column table, padding otherwise
        let blank = record.len() == 1 && !record[0].quoted && record[0].text.trim().is_empty();
        if blank && width > 1 {
            continue;
        }
        if record.len() != width {
            return Err(Error::Io(format!(
                "row {} of table {} has {} values, expected {}",
                i + 1,
                name,
                record.len(),
                width
            )));
        }

        let row = table
            .columns()
            .iter()
            .zip(&record)
            .map(|(col, field)| -> Result<(String, Value)> {
                Ok((col.name.clone(), decode_value(col, field)?))
            })
            .collect::<Result<Row>>()?;
        table.insert(row).map_err(|err| {
            Error::Io(format!("error loading row {} of table {}: {}", i + 1, name, err))
        })?;
    }

    debug!(table = name, rows = table.len(), "decoded table");
    Ok(table)
}

fn decode_header(line: &str) -> Result<Vec<Column>> {
    let Some(defs) = line.strip_prefix(SCHEMA_PREFIX) else {
        return Err(Error::Io(format!("invalid schema line: {}", line)));
    };

    defs.split(',')
        .map(|def| -> Result<Column> {
            let mut parts = def.trim().split(':');
            let (Some(name), Some(datatype)) = (parts.next(), parts.next()) else {
                return Err(Error::Io(format!("invalid column definition: {}", def)));
            };
            if name.is_empty() {
                return Err(Error::Io(format!("invalid column definition: {}", def)));
            }
            let datatype = DataType::from_name(datatype).ok_or_else(|| {
                Error::Io(format!("unknown data type {} for column {}", datatype, name))
            })?;

            let mut column = Column::new(name, datatype);
            for flag in parts {
                match flag {
                    PRIMARY_KEY => column.primary_key = true,
                    UNIQUE => column.unique = true,
                    _ => {}
                }
            }
            Ok(column)
        })
        .collect()
}

fn decode_value(col: &Column, field: &Field) -> Result<Value> {
    let text = if field.quoted {
        field.text.as_str()
    } else {
        field.text.trim()
    };
    if text.is_empty() && !(field.quoted && col.datatype == DataType::Text) {
        return Ok(Value::Null);
    }

    Ok(match col.datatype {
        DataType::Text => Value::Text(text.to_string()),
        DataType::Integer => Value::Integer(text.trim().parse::<i64>().map_err(|err| {
            Error::Io(format!("invalid integer {} for column {}: {}", text, col.name, err))
        })?),
        DataType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Boolean(true),
            "false" | "0" => Value::Boolean(false),
            _ => {
                return Err(Error::Io(format!(
                    "invalid boolean {} for column {}",
                    text, col.name
                )));
            }
        },
    })
}

/// A raw field; a quoted empty field is empty text, an unquoted one is Null
#[derive(Debug, Default, PartialEq)]
struct Field {
    text: String,
    quoted: bool,
}

/// Splits a body into records of fields
///
/// Quote-aware: commas and line breaks inside quotes are data and `""`
/// inside quotes is a literal quote.
struct Records<'a> {
    iter: Peekable<Chars<'a>>,
}

impl<'a> Records<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            iter: body.chars().peekable(),
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Vec<Field>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.peek()?;

        let mut fields = Vec::new();
        let mut current = Field::default();
        let mut in_quotes = false;
        while let Some(c) = self.iter.next() {
            match c {
                '"' if in_quotes && self.iter.peek() == Some(&'"') => {
                    self.iter.next();
                    current.text.push('"');
                }
                '"' if in_quotes => in_quotes = false,
                '"' => {
                    in_quotes = true;
                    current.quoted = true;
                }
                ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
                '\r' if !in_quotes && self.iter.peek() == Some(&'\n') => {}
                '\n' if !in_quotes => break,
                c => current.text.push(c),
            }
        }
        fields.push(current);
        Some(fields)
    }
}
