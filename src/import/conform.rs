//! Schema conformance: an optional pre-pass that turns positional rows into typed records.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::{IngestError, IngestResult};
use crate::types::{DataType, Field, Record, Row, Schema, Value};

use super::header::Header;

/// Reshapes the data rows of a table before they are normalized.
///
/// The outer `Err` is structural and aborts the import. An inner `Err` rejects a single row;
/// the import records it as an [`super::ImportError`] for that row and moves on.
///
/// Any closure with the same signature is a conformer.
pub trait Conformer: Send + Sync {
    fn conform(&self, header: &Header, rows: Vec<Vec<Value>>) -> IngestResult<Vec<anyhow::Result<Row>>>;
}

impl<F> Conformer for F
where
    F: Fn(&Header, Vec<Vec<Value>>) -> IngestResult<Vec<anyhow::Result<Row>>> + Send + Sync,
{
    fn conform(&self, header: &Header, rows: Vec<Vec<Value>>) -> IngestResult<Vec<anyhow::Result<Row>>> {
        self(header, rows)
    }
}

/// A cell that could not be coerced into its field's [`DataType`].
#[derive(Debug, Error)]
#[error("failed to parse value in column '{column}': {message} (raw='{raw}')")]
pub struct CoercionError {
    pub column: String,
    pub raw: String,
    pub message: String,
}

impl Schema {
    /// Parse a schema from JSON, e.g. `{"fields":[{"name":"id","data_type":"int64"}]}`.
    pub fn from_json_str(input: &str) -> IngestResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and parse a JSON schema file.
    pub fn from_json_path(path: impl AsRef<Path>) -> IngestResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn conform_row(&self, col_idxs: &[usize], cells: &[Value]) -> Result<Row, CoercionError> {
        let mut record = Record::new();
        for (field, &idx) in self.fields.iter().zip(col_idxs) {
            let cell = cells.get(idx).unwrap_or(&Value::Null);
            record.insert(field.name.clone(), coerce(field, cell)?);
        }
        Ok(Row::Structured(record))
    }
}

/// Every schema field must appear in the header (order can differ). Records are keyed by the
/// schema's field names, not the header text.
impl Conformer for Schema {
    fn conform(&self, header: &Header, rows: Vec<Vec<Value>>) -> IngestResult<Vec<anyhow::Result<Row>>> {
        let mut col_idxs = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            match header.position(&field.name) {
                Some(idx) => col_idxs.push(idx),
                None => {
                    return Err(IngestError::MissingRequiredColumn {
                        column: field.name.clone(),
                    });
                }
            }
        }

        Ok(rows
            .iter()
            .map(|cells| self.conform_row(&col_idxs, cells).map_err(anyhow::Error::from))
            .collect())
    }
}

fn coerce(field: &Field, cell: &Value) -> Result<Value, CoercionError> {
    let err = |message: &str| CoercionError {
        column: field.name.clone(),
        raw: cell.to_string(),
        message: message.to_string(),
    };

    let text = match cell {
        Value::Null => return Ok(Value::Null),
        Value::Utf8(s) if s.trim().is_empty() => return Ok(Value::Null),
        Value::Utf8(s) => Some(s.trim()),
        _ => None,
    };

    match (field.data_type, cell) {
        (DataType::Utf8, _) => Ok(Value::Utf8(text.map(str::to_owned).unwrap_or_else(|| cell.to_string()))),

        (DataType::Int64, Value::Int64(v)) => Ok(Value::Int64(*v)),
        (DataType::Int64, Value::Float64(f)) if f.fract() != 0.0 => {
            Err(err("expected integer (got non-integer float)"))
        }
        // `i64::MAX as f64` is 2^63, itself out of range.
        (DataType::Int64, Value::Float64(f)) if *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Ok(Value::Int64(*f as i64))
        }
        (DataType::Int64, Value::Float64(_)) => Err(err("integer out of range")),
        (DataType::Int64, Value::Utf8(_)) => text
            .unwrap_or_default()
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| err(&e.to_string())),
        (DataType::Int64, _) => Err(err("expected integer")),

        (DataType::Float64, Value::Float64(f)) => Ok(Value::Float64(*f)),
        (DataType::Float64, Value::Int64(i)) => Ok(Value::Float64(*i as f64)),
        (DataType::Float64, Value::Utf8(_)) => text
            .unwrap_or_default()
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| err(&e.to_string())),
        (DataType::Float64, _) => Err(err("expected number")),

        (DataType::Bool, Value::Bool(b)) => Ok(Value::Bool(*b)),
        (DataType::Bool, Value::Int64(i)) => Ok(Value::Bool(*i != 0)),
        (DataType::Bool, Value::Float64(f)) => Ok(Value::Bool(*f != 0.0)),
        (DataType::Bool, _) => parse_bool(text.unwrap_or_default())
            .map(Value::Bool)
            .map_err(|message| err(message)),
    }
}

fn parse_bool(s: &str) -> Result<bool, &'static str> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)"),
    }
}

#[cfg(test)]
mod tests {
    use super::Conformer;
    use crate::error::IngestError;
    use crate::import::header::Header;
    use crate::types::{DataType, Field, Row, Schema, Value};

    fn people_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
            Field::new("score", DataType::Float64),
            Field::new("active", DataType::Bool),
        ])
    }

    fn header(names: &[&str]) -> Header {
        Header::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn strings(cells: &[&str]) -> Vec<Value> {
        cells.iter().map(|c| Value::from(*c)).collect()
    }

    #[test]
    fn conforms_reordered_columns_into_typed_records() {
        let h = header(&["Name", "ID", "Active", "Score"]);
        let rows = schema_rows(&people_schema(), &h, vec![strings(&["Ada", "1", "yes", "98.5"])]);

        let Row::Structured(rec) = rows.into_iter().next().unwrap().unwrap() else {
            panic!("expected structured row");
        };
        assert_eq!(rec.get("id"), Some(&Value::Int64(1)));
        assert_eq!(rec.get("name"), Some(&Value::from("Ada")));
        assert_eq!(rec.get("score"), Some(&Value::Float64(98.5)));
        assert_eq!(rec.get("active"), Some(&Value::Bool(true)));
    }

    #[test]
    fn accepts_native_workbook_types() {
        let h = header(&["id", "name", "score", "active"]);
        let rows = schema_rows(
            &people_schema(),
            &h,
            vec![vec![Value::Float64(2.0), Value::Int64(7), Value::Int64(3), Value::Float64(0.0)]],
        );

        let Row::Structured(rec) = rows.into_iter().next().unwrap().unwrap() else {
            panic!("expected structured row");
        };
        assert_eq!(rec.get("id"), Some(&Value::Int64(2)));
        assert_eq!(rec.get("name"), Some(&Value::from("7")));
        assert_eq!(rec.get("score"), Some(&Value::Float64(3.0)));
        assert_eq!(rec.get("active"), Some(&Value::Bool(false)));
    }

    #[test]
    fn rejects_only_the_bad_row() {
        let h = header(&["id", "name", "score", "active"]);
        let rows = schema_rows(
            &people_schema(),
            &h,
            vec![
                strings(&["not_an_int", "Ada", "1", "true"]),
                strings(&["2", "Grace", "", "false"]),
            ],
        );

        let msg = rows[0].as_ref().unwrap_err().to_string();
        assert!(msg.contains("failed to parse value in column 'id'"));
        assert!(msg.contains("raw='not_an_int'"));

        let Ok(Row::Structured(rec)) = &rows[1] else {
            panic!("expected second row to conform");
        };
        assert_eq!(rec.get("score"), Some(&Value::Null));
    }

    #[test]
    fn whole_floats_outside_i64_range_are_rejected() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
        let rows = schema_rows(
            &schema,
            &header(&["id"]),
            vec![
                vec![Value::Float64(1e30)],
                vec![Value::Float64(-1e30)],
                vec![Value::Float64(-9_223_372_036_854_775_808.0)],
            ],
        );

        for row in &rows[..2] {
            let msg = row.as_ref().unwrap_err().to_string();
            assert!(msg.contains("integer out of range"), "{msg}");
        }
        let Ok(Row::Structured(rec)) = &rows[2] else {
            panic!("i64::MIN should conform");
        };
        assert_eq!(rec.get("id"), Some(&Value::Int64(i64::MIN)));
    }

    #[test]
    fn missing_schema_column_is_structural() {
        let h = header(&["id", "name", "score"]);
        let err = people_schema().conform(&h, Vec::new()).unwrap_err();
        assert!(matches!(err, IngestError::MissingRequiredColumn { ref column } if column == "active"));
    }

    #[test]
    fn schema_loads_from_json() {
        let schema = Schema::from_json_str(
            r#"{"fields":[{"name":"id","data_type":"int64"},{"name":"ok","data_type":"bool"}]}"#,
        )
        .unwrap();
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["id", "ok"]);
        assert_eq!(schema.fields[1].data_type, DataType::Bool);

        let err = Schema::from_json_str("{").unwrap_err();
        assert!(matches!(err, IngestError::Schema(_)));
    }

    #[test]
    fn schema_loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"fields":[{"name":"email","data_type":"utf8"},{"name":"age","data_type":"int64"}]}"#,
        )
        .unwrap();

        let schema = Schema::from_json_path(&path).unwrap();
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["email", "age"]);
        assert_eq!(schema.fields[1].data_type, DataType::Int64);

        let err = Schema::from_json_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }

    #[test]
    fn closures_are_conformers() {
        let passthrough = |_: &Header, rows: Vec<Vec<Value>>| -> crate::IngestResult<Vec<anyhow::Result<Row>>> {
            Ok(rows.into_iter().map(|r| Ok(Row::Positional(r))).collect())
        };
        let out = passthrough.conform(&header(&["a"]), vec![strings(&["x"])]).unwrap();
        assert_eq!(out.len(), 1);
    }

    fn schema_rows(schema: &Schema, h: &Header, rows: Vec<Vec<Value>>) -> Vec<anyhow::Result<Row>> {
        schema.conform(h, rows).unwrap()
    }
}
