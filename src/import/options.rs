use std::fmt;
use std::sync::Arc;

use crate::ingestion::observability::{ImportObserver, ImportSeverity};
use crate::ingestion::unified::SourceFormat;

use super::conform::Conformer;

/// Options controlling an import.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ImportOptions {
    /// If `None`, [`crate::ingestion::import_from_path`] infers the format from the extension.
    pub format: Option<SourceFormat>,
    /// Workbook sheet to read, matched case-insensitively. `None` reads every sheet and
    /// concatenates their rows.
    /// Ignored for delimited text.
    pub sheet_name: Option<String>,
    /// 1-based source row holding the header; rows above it are discarded.
    pub start_row: usize,
    /// Columns that must be present in the header before any row is processed.
    pub required_columns: Vec<String>,
    /// Optional conformance pre-pass (e.g. a typed [`crate::types::Schema`]).
    pub schema: Option<Arc<dyn Conformer>>,
    /// Attach the full diagnostic (cause chain, backtrace) to each row error.
    pub error_detail: bool,
    /// Lowercase header names. `None` uses the source default: delimited text lowercases,
    /// workbooks and in-memory tables keep the original case.
    pub lowercase_headers: Option<bool>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ImportObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ImportSeverity,
}

impl ImportOptions {
    /// Require `columns` to be present in the header.
    pub fn require<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_schema(mut self, schema: impl Conformer + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("format", &self.format)
            .field("sheet_name", &self.sheet_name)
            .field("start_row", &self.start_row)
            .field("required_columns", &self.required_columns)
            .field("schema_set", &self.schema.is_some())
            .field("error_detail", &self.error_detail)
            .field("lowercase_headers", &self.lowercase_headers)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            format: None,
            sheet_name: None,
            start_row: 1,
            required_columns: Vec::new(),
            schema: None,
            error_detail: false,
            lowercase_headers: None,
            observer: None,
            alert_at_or_above: ImportSeverity::Critical,
        }
    }
}
