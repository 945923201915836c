//! `spreadsheet-importer` turns spreadsheet-like sources into a uniform sequence of row
//! records, one row at a time, without letting a single bad row abort the import.
//!
//! ## What you can import
//!
//! - **Workbooks** (Cargo feature `excel`, on by default): `.xlsx`, `.xlsm`, `.xlsb`, `.xls`,
//!   `.ods`. A named sheet (case-insensitive), or every sheet with their rows concatenated.
//! - **Delimited text**: `.csv`, `.tsv`, `.txt`. The encoding is detected (BOM, UTF-8,
//!   Windows-1252 fallback), a leading byte-order mark is dropped, and the separator is a tab
//!   if the text contains any tab, a comma otherwise.
//! - **In-memory tables**: [`types::RawTable`].
//!
//! ## Pipeline
//!
//! source → [`types::RawTable`] → skip intro rows (`start_row`) → header → required-column
//! check → optional [`import::Conformer`] (e.g. a typed [`types::Schema`]) → per-row
//! [`types::Record`] → caller callback. Callback failures become [`import::ImportError`]s
//! carrying the row's number in the original source; the remaining rows are still processed.
//!
//! ## Quick example
//!
//! ```no_run
//! use anyhow::ensure;
//! use spreadsheet_importer::ingestion::import_from_path;
//! use spreadsheet_importer::import::ImportOptions;
//!
//! # fn main() -> Result<(), spreadsheet_importer::IngestError> {
//! let opts = ImportOptions {
//!     sheet_name: Some("Contacts".to_string()),
//!     start_row: 3,
//!     ..Default::default()
//! }
//! .require(["email"]);
//!
//! let import = import_from_path("contacts.xlsx", &opts)?;
//! let summary = import.run(|record, _index, _row| {
//!     ensure!(record.text("email").is_some_and(|e| e.contains('@')), "invalid email");
//!     Ok(())
//! });
//!
//! for error in &summary.errors {
//!     eprintln!("{error}"); // "Row 7: invalid email"
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming
//!
//! [`import::Import::stream`] returns a lazy iterator. Rows are processed only as they are
//! pulled; failures collect in the stream's [`import::ErrorLog`], which is complete once the
//! stream is drained.
//!
//! ```rust
//! use spreadsheet_importer::import::{Import, ImportOptions};
//! use spreadsheet_importer::types::RawTable;
//!
//! let table = RawTable::from_strings([["id"], ["1"], ["oops"], ["3"]]);
//! let import = Import::prepare(table, &ImportOptions::default()).unwrap();
//!
//! let mut stream = import.stream(|rec, _, _| {
//!     rec.text("id").unwrap_or_default().parse::<i64>()?;
//!     Ok(())
//! });
//! let log = stream.error_log();
//! let ok: Vec<_> = stream.by_ref().map(|row| row.row_number).collect();
//!
//! assert_eq!(ok, vec![2, 4]);
//! assert_eq!(log.errors()[0].row, 3);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: loaders, format detection and path-based entrypoints
//! - [`import`]: header checks, row normalization, conformance and the fault-isolated loop
//! - [`types`]: cell values, tables, records and schemas
//! - [`error`]: structural error type

pub mod error;
pub mod import;
pub mod ingestion;
pub mod types;

pub use error::{IngestError, IngestResult};
pub use import::{import_from_table, Import, ImportError, ImportOptions, ImportSummary};
pub use ingestion::{import_from_delimited_text, import_from_path, import_from_workbook};
