//! Header extraction and required-column checks.

use crate::error::{IngestError, IngestResult};
use crate::types::Value;

/// Normalize a column name for comparison: trim, collapse internal whitespace, lowercase.
///
/// `" Email "`, `"email"` and `"EMAIL"` all normalize to `"email"`.
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ordered column names taken from the header row.
///
/// Names keep their source text; lookups go through [`normalize_column_name`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
    normalized: Vec<String>,
}

impl Header {
    pub fn new(names: Vec<String>) -> Self {
        let normalized = names.iter().map(|n| normalize_column_name(n)).collect();
        Self { names, normalized }
    }

    /// Build a header from a row of cells. Null cells become empty names.
    pub fn from_cells(cells: &[Value]) -> Self {
        Self::new(cells.iter().map(|c| c.to_string()).collect())
    }

    /// Column names in source order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of the first column whose normalized name matches `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        let wanted = normalize_column_name(name);
        self.normalized.iter().position(|n| *n == wanted)
    }

    /// Normalized presence check.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Lowercase every column name in place.
    pub(crate) fn lowercase(&mut self) {
        for name in &mut self.names {
            *name = name.to_lowercase();
        }
    }
}

/// Fail on the first name in `required` that is absent from `header`.
///
/// Names are checked in the order given, so the reported column is deterministic.
pub fn assert_required<S: AsRef<str>>(header: &Header, required: &[S]) -> IngestResult<()> {
    for name in required {
        let name = name.as_ref();
        if !header.contains(name) {
            return Err(IngestError::MissingRequiredColumn {
                column: name.to_string(),
            });
        }
    }
    Ok(())
}
