//! Core data model types.
//!
//! Loaders produce a [`RawTable`] of [`Value`] cells. The import pipeline turns each table row
//! (a [`Row`]) into a [`Record`] keyed by column name. A [`Schema`] (a list of typed
//! [`Field`]s) optionally coerces rows into typed records first.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::import::header::normalize_column_name;

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name, matched against the header case- and whitespace-insensitively.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the expected shape of incoming rows.
///
/// Used as a conformance step (see [`crate::import::Conformer`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl fmt::Display for Value {
    /// Null renders as the empty string; whole floats render without a fraction (`2.0` → `2`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

/// Two-dimensional grid of cells produced by a loader.
///
/// `first_row` is the 1-based row number, in the original source, of `rows[0]`. Workbook
/// sheets whose used range starts below the first row have `first_row > 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Row-major cell storage.
    pub rows: Vec<Vec<Value>>,
    /// Source row number of the first stored row.
    pub first_row: usize,
}

impl RawTable {
    /// Create a table whose first stored row is source row 1.
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self { rows, first_row: 1 }
    }

    /// Create a table whose first stored row is `first_row` in the source.
    pub fn with_first_row(rows: Vec<Vec<Value>>, first_row: usize) -> Self {
        Self {
            rows,
            first_row: first_row.max(1),
        }
    }

    /// Build a table of string cells; empty strings become [`Value::Null`].
    pub fn from_strings<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell.as_ref() {
                        "" => Value::Null,
                        s => Value::Utf8(s.to_owned()),
                    })
                    .collect()
            })
            .collect();
        Self::new(rows)
    }

    /// Number of stored rows (header included).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column name → value mapping for one row.
///
/// Keys are unique and iterate in sorted order. Inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the value it replaced.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(column.into(), value)
    }

    /// Exact-name lookup.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Lookup that ignores case and surrounding/repeated whitespace in column names.
    ///
    /// Falls back to a linear scan when no key matches exactly.
    pub fn find(&self, column: &str) -> Option<&Value> {
        if let Some(v) = self.values.get(column) {
            return Some(v);
        }
        let wanted = normalize_column_name(column);
        self.values
            .iter()
            .find(|(k, _)| normalize_column_name(k) == wanted)
            .map(|(_, v)| v)
    }

    /// Convenience accessor for string cells, using [`Record::find`].
    pub fn text(&self, column: &str) -> Option<&str> {
        self.find(column).and_then(Value::as_str)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(column, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// One table row, either still positional or already keyed by a conformance step.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Cells aligned positionally with the header.
    Positional(Vec<Value>),
    /// A record produced by a [`crate::import::Conformer`].
    Structured(Record),
}
