#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use crate::error::{IngestError, IngestResult};
use crate::types::{RawTable, Value};

/// Load a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into a [`RawTable`].
///
/// Behavior:
/// - With `sheet_name`, reads the sheets whose name matches it case-insensitively after
///   trimming; fails with [`IngestError::MissingRequiredSheet`] when none does
/// - Without `sheet_name`, reads every sheet in workbook order
/// - Rows of the selected sheets are concatenated. `first_row` comes from the first sheet with
///   any cells: if its used range starts at row 3, the returned table has `first_row == 3`
pub fn load_workbook(path: impl AsRef<Path>, sheet_name: Option<&str>) -> IngestResult<RawTable> {
    let mut workbook = open_workbook_auto(path)?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut table = RawTable::new(Vec::new());
    for sheet in select_sheets(&names, sheet_name)? {
        let range = workbook.worksheet_range(&sheet)?;
        let part = range_to_table(&range);
        debug!(
            sheet = %sheet,
            first_row = part.first_row,
            rows = part.row_count(),
            "loaded worksheet"
        );
        if table.is_empty() {
            table = part;
        } else {
            table.rows.extend(part.rows);
        }
    }
    Ok(table)
}

fn select_sheets(sheets: &[String], wanted: Option<&str>) -> IngestResult<Vec<String>> {
    if sheets.is_empty() {
        return Err(IngestError::UnsupportedFormat {
            message: "workbook has no sheets".to_string(),
        });
    }

    let Some(wanted) = wanted else {
        return Ok(sheets.to_vec());
    };
    let key = wanted.trim().to_lowercase();
    let matched: Vec<String> = sheets
        .iter()
        .filter(|name| name.trim().to_lowercase() == key)
        .cloned()
        .collect();
    if matched.is_empty() {
        return Err(IngestError::MissingRequiredSheet {
            sheet: wanted.to_string(),
        });
    }
    Ok(matched)
}

fn range_to_table(range: &Range<Data>) -> RawTable {
    let first_row = range.start().map_or(0, |(row, _)| row as usize) + 1;
    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    RawTable::with_first_row(rows, first_row)
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        // Dates, durations and cell errors keep their displayed text.
        _ => Value::Utf8(c.to_string()),
    }
}
