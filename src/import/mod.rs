//! Row normalization and the fault-isolated import loop.
//!
//! An [`Import`] is prepared once from a [`RawTable`]:
//!
//! 1. rows above [`ImportOptions::start_row`] are discarded,
//! 2. the next row becomes the [`Header`],
//! 3. [`ImportOptions::required_columns`] are checked (fail fast, before any row work),
//! 4. the optional [`Conformer`] reshapes the data rows.
//!
//! It can then be consumed any number of times:
//!
//! - [`Import::run`] (summary mode) processes every row and returns an [`ImportSummary`],
//! - [`Import::stream`] (streaming mode) returns a lazy [`ImportStream`] plus its [`ErrorLog`],
//! - [`Import::records`] yields normalized records without a callback.
//!
//! ```rust
//! use anyhow::ensure;
//! use spreadsheet_importer::import::{import_from_table, ImportOptions};
//! use spreadsheet_importer::types::RawTable;
//!
//! # fn main() -> Result<(), spreadsheet_importer::IngestError> {
//! let table = RawTable::from_strings([
//!     ["name", "email"],
//!     ["Ann", "a@x.com"],
//!     ["Bob", "bad"],
//! ]);
//! let opts = ImportOptions::default().require(["email"]);
//!
//! let summary = import_from_table(table, &opts, |rec, _, _| {
//!     ensure!(rec.text("email").is_some_and(|e| e.contains('@')), "invalid email");
//!     Ok(())
//! })?;
//!
//! assert_eq!(summary.imported, 1);
//! assert_eq!(summary.total, 2);
//! assert_eq!(summary.error_messages(), vec!["Row 3: invalid email".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod conform;
pub mod header;
pub mod normalize;
mod options;
mod report;
mod stream;

use std::sync::Arc;

use tracing::debug;

use crate::error::IngestResult;
use crate::ingestion::observability::{report_failure, ImportContext, ImportObserver};
use crate::types::{RawTable, Record, Row};

pub use conform::{CoercionError, Conformer};
pub use header::{assert_required, normalize_column_name, Header};
pub use normalize::row_to_record;
pub use options::ImportOptions;
pub use report::{ErrorLog, ImportError, ImportSummary};
pub use stream::{ImportStream, ImportedRow, RowCallback};

/// A data row after the conformance pre-pass.
#[derive(Debug)]
pub(crate) enum PreparedRow {
    Ready(Row),
    Rejected { message: String, detail: String },
}

/// A loaded, validated table ready to be processed row by row.
pub struct Import {
    header: Header,
    header_row: usize,
    first_data_row: usize,
    rows: Vec<PreparedRow>,
    error_detail: bool,
    observer: Option<Arc<dyn ImportObserver>>,
    context: ImportContext,
}

impl std::fmt::Debug for Import {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Import")
            .field("header", &self.header)
            .field("header_row", &self.header_row)
            .field("data_rows", &self.rows.len())
            .field("context", &self.context)
            .finish()
    }
}

impl Import {
    /// Prepare an in-memory table.
    ///
    /// Fails with [`crate::IngestError::MissingRequiredColumn`] when a required column (or a
    /// schema field) is absent; no rows are attempted in that case.
    pub fn prepare(table: RawTable, options: &ImportOptions) -> IngestResult<Self> {
        Self::prepare_with(table, options, ImportContext::default(), false)
    }

    pub(crate) fn prepare_with(
        table: RawTable,
        options: &ImportOptions,
        context: ImportContext,
        lowercase_by_default: bool,
    ) -> IngestResult<Self> {
        let RawTable { mut rows, first_row } = table;

        // `start_row` is absolute; the table may already begin below it.
        let skip = options.start_row.max(1).saturating_sub(first_row).min(rows.len());
        rows.drain(..skip);
        let header_row = first_row + skip;

        let mut rows = rows.into_iter();
        let mut header = rows
            .next()
            .map(|cells| Header::from_cells(&cells))
            .unwrap_or_default();
        if options.lowercase_headers.unwrap_or(lowercase_by_default) {
            header.lowercase();
        }

        assert_required(&header, &options.required_columns)?;

        let data: Vec<_> = rows.collect();
        let rows: Vec<PreparedRow> = match &options.schema {
            Some(schema) => schema
                .conform(&header, data)?
                .into_iter()
                .map(|row| match row {
                    Ok(row) => PreparedRow::Ready(row),
                    Err(e) => PreparedRow::Rejected {
                        message: e.to_string(),
                        detail: format!("{e:?}"),
                    },
                })
                .collect(),
            None => data
                .into_iter()
                .map(|cells| PreparedRow::Ready(Row::Positional(cells)))
                .collect(),
        };

        debug!(
            header_row,
            columns = header.len(),
            data_rows = rows.len(),
            conformed = options.schema.is_some(),
            "import prepared"
        );

        Ok(Self {
            header,
            header_row,
            first_data_row: header_row + 1,
            rows,
            error_detail: options.error_detail,
            observer: options.observer.clone(),
            context,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Source row number of the header row.
    pub fn header_row(&self) -> usize {
        self.header_row
    }

    /// Number of data rows that will be attempted.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn context(&self) -> &ImportContext {
        &self.context
    }

    /// Streaming mode: a lazy pass that invokes `callback` on each pulled row.
    ///
    /// Failed rows are skipped and recorded in [`ImportStream::error_log`].
    pub fn stream<'a, F>(&'a self, callback: F) -> ImportStream<'a>
    where
        F: FnMut(&Record, usize, usize) -> anyhow::Result<()> + 'a,
    {
        ImportStream::new(self, Some(Box::new(callback)))
    }

    /// Streaming mode without a callback: yields every normalized record.
    pub fn records(&self) -> ImportStream<'_> {
        ImportStream::new(self, None)
    }

    /// Summary mode: process every row and report counts and errors.
    pub fn run<F>(&self, callback: F) -> ImportSummary
    where
        F: FnMut(&Record, usize, usize) -> anyhow::Result<()>,
    {
        self.stream(callback).finish()
    }
}

/// Prepare `table` and run `callback` over every data row (summary mode).
///
/// Structural failures are reported to [`ImportOptions::observer`] and returned; row failures
/// end up in [`ImportSummary::errors`].
pub fn import_from_table<F>(table: RawTable, options: &ImportOptions, callback: F) -> IngestResult<ImportSummary>
where
    F: FnMut(&Record, usize, usize) -> anyhow::Result<()>,
{
    let ctx = ImportContext::default();
    let import = report_failure(options, &ctx, Import::prepare(table, options))?;
    Ok(import.run(callback))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use anyhow::{bail, ensure};

    use super::{import_from_table, Import, ImportOptions};
    use crate::error::IngestError;
    use crate::types::{DataType, Field, RawTable, Schema, Value};

    fn contacts() -> RawTable {
        RawTable::from_strings([["name", "email"], ["Ann", "a@x.com"], ["Bob", "bad"]])
    }

    fn valid_email(rec: &crate::types::Record) -> anyhow::Result<()> {
        ensure!(
            rec.text("email").is_some_and(|e| e.contains('@')),
            "email must contain '@'"
        );
        Ok(())
    }

    #[test]
    fn bad_row_is_isolated() {
        let opts = ImportOptions::default().require(["email"]);
        let summary = import_from_table(contacts(), &opts, |rec, _, _| valid_email(rec)).unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.error_messages(), vec!["Row 3: email must contain '@'".to_string()]);
    }

    #[test]
    fn header_only_table_is_not_an_error() {
        let table = RawTable::from_strings([["name", "email"]]);
        let summary = import_from_table(table, &ImportOptions::default(), |_, _, _| Ok(())).unwrap();
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.total, 0);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn empty_table_has_empty_header() {
        let import = Import::prepare(RawTable::new(Vec::new()), &ImportOptions::default()).unwrap();
        assert!(import.header().is_empty());
        assert_eq!(import.row_count(), 0);
    }

    #[test]
    fn missing_required_column_runs_no_rows() {
        let calls = Cell::new(0);
        let opts = ImportOptions::default().require(["Phone"]);
        let err = import_from_table(contacts(), &opts, |_, _, _| {
            calls.set(calls.get() + 1);
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, IngestError::MissingRequiredColumn { ref column } if column == "Phone"));
        assert_eq!(err.to_string(), "spreadsheet must include a 'Phone' column");
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn start_row_keeps_source_numbering() {
        let table = RawTable::from_strings([
            vec!["Quarterly export", ""],
            vec!["", ""],
            vec!["name", "email"],
            vec!["Ann", "a@x.com"],
            vec!["Bob", "b@x.com"],
        ]);
        let opts = ImportOptions {
            start_row: 3,
            ..Default::default()
        };
        let import = Import::prepare(table, &opts).unwrap();
        assert_eq!(import.header_row(), 3);

        let numbers: Vec<_> = import.records().map(|r| (r.index, r.row_number)).collect();
        assert_eq!(numbers, vec![(0, 4), (1, 5)]);
    }

    #[test]
    fn numbering_ignores_earlier_failures() {
        let table = RawTable::from_strings((0..6).map(|i| vec![i.to_string()]));
        let opts = ImportOptions {
            start_row: 2,
            ..Default::default()
        };
        let seen = std::cell::RefCell::new(Vec::new());
        let summary = import_from_table(table, &opts, |_, index, row_number| {
            seen.borrow_mut().push((index, row_number));
            if index % 2 == 0 {
                bail!("even");
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(*seen.borrow(), vec![(0, 3), (1, 4), (2, 5), (3, 6)]);
        let rows: Vec<_> = summary.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![3, 5]);
        assert_eq!(summary.imported + summary.failed(), summary.total);
    }

    #[test]
    fn table_starting_below_start_row_uses_its_first_row_as_header() {
        let table = RawTable::with_first_row(
            vec![
                vec![Value::from("id")],
                vec![Value::Int64(1)],
            ],
            4,
        );
        let import = Import::prepare(table, &ImportOptions::default()).unwrap();
        assert_eq!(import.header_row(), 4);
        assert_eq!(import.records().next().unwrap().row_number, 5);
    }

    #[test]
    fn runs_are_idempotent() {
        let import = Import::prepare(contacts(), &ImportOptions::default()).unwrap();
        let first = import.run(|rec, _, _| valid_email(rec));
        let second = import.run(|rec, _, _| valid_email(rec));
        assert_eq!(first, second);
    }

    #[test]
    fn always_and_never_failing_callbacks() {
        let import = Import::prepare(contacts(), &ImportOptions::default()).unwrap();

        let ok = import.run(|_, _, _| Ok(()));
        assert_eq!(ok.imported, ok.total);
        assert!(ok.is_clean());

        let failing = import.run(|_, _, _| bail!("nope"));
        assert_eq!(failing.imported, 0);
        assert_eq!(failing.errors.len(), failing.total);
    }

    #[test]
    fn schema_rejections_become_row_errors() {
        let table = RawTable::from_strings([["id", "name"], ["1", "Ann"], ["x", "Bob"], ["3", "Cy"]]);
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
        ]);
        let opts = ImportOptions::default().with_schema(schema);

        let import = Import::prepare(table, &opts).unwrap();
        let mut ids = Vec::new();
        let summary = import.run(|rec, _, _| {
            ids.push(rec.get("id").cloned());
            Ok(())
        });

        assert_eq!(ids, vec![Some(Value::Int64(1)), Some(Value::Int64(3))]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 3);
        assert!(summary.errors[0].message.contains("column 'id'"));
    }

    #[test]
    fn error_detail_carries_cause_chain() {
        let opts = ImportOptions {
            error_detail: true,
            ..Default::default()
        };
        let summary = import_from_table(contacts(), &opts, |_, _, _| {
            Err(anyhow::anyhow!("socket closed").context("could not store row"))
        })
        .unwrap();

        let err = &summary.errors[0];
        assert_eq!(err.message, "could not store row");
        assert!(err.detail.as_deref().unwrap().contains("socket closed"));
    }

    #[test]
    fn lowercase_headers_is_opt_in_for_tables() {
        let table = RawTable::from_strings([["Name"], ["Ann"]]);
        let keep = Import::prepare(table.clone(), &ImportOptions::default()).unwrap();
        assert!(keep.records().next().unwrap().record.contains_key("Name"));

        let opts = ImportOptions {
            lowercase_headers: Some(true),
            ..Default::default()
        };
        let lower = Import::prepare(table, &opts).unwrap();
        assert!(lower.records().next().unwrap().record.contains_key("name"));
    }
}
