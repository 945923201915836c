//! Row → record mapping.

use crate::types::{Record, Row, Value};

use super::header::Header;

/// Map a row onto the header, producing a [`Record`].
///
/// - [`Row::Positional`]: column `i` is keyed by `header[i]`. Missing trailing cells become
///   [`Value::Null`], cells past the last header column are dropped, blank header names are
///   skipped, and duplicate names resolve last-wins.
/// - [`Row::Structured`]: the record is returned unchanged.
pub fn row_to_record(header: &Header, row: &Row) -> Record {
    match row {
        Row::Positional(cells) => header
            .names()
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.trim().is_empty())
            .map(|(idx, name)| (name.clone(), cells.get(idx).cloned().unwrap_or(Value::Null)))
            .collect(),
        Row::Structured(record) => record.clone(),
    }
}
