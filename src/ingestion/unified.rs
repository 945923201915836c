//! Unified import entrypoints.
//!
//! Most callers should use [`import_from_path`], which loads a file into a prepared
//! [`Import`] ready to be run or streamed.
//!
//! - If [`ImportOptions::format`] is `None`, the format is inferred from the file extension.
//! - If an [`super::observability::ImportObserver`] is provided, failures/alerts (and, once an
//!   import is consumed, row errors and totals) are reported to it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, IngestResult};
use crate::import::{Import, ImportOptions};

use super::delimited::open_delimited;
use super::observability::{report_failure, ImportContext};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Spreadsheet workbooks (feature-gated behind `excel`).
    Workbook,
    /// Delimited text (comma or tab separated) of any common encoding.
    Delimited,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "csv" | "tsv" | "tab" | "txt" => Some(Self::Delimited),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workbook => f.write_str("workbook"),
            Self::Delimited => f.write_str("delimited"),
        }
    }
}

/// Unified import entry point for path-based sources.
///
/// Structural failures (unreadable file, missing sheet, missing required column) are returned
/// here. Row failures surface later, when the returned [`Import`] is run or streamed.
///
/// ```no_run
/// use spreadsheet_importer::ingestion::import_from_path;
/// use spreadsheet_importer::import::ImportOptions;
///
/// # fn main() -> Result<(), spreadsheet_importer::IngestError> {
/// let opts = ImportOptions::default().require(["email"]);
/// let import = import_from_path("contacts.csv", &opts)?;
/// let summary = import.run(|record, _, _| {
///     println!("{:?}", record.text("email"));
///     Ok(())
/// });
/// println!("imported {} of {}", summary.imported, summary.total);
/// # Ok(())
/// # }
/// ```
pub fn import_from_path(path: impl AsRef<Path>, options: &ImportOptions) -> IngestResult<Import> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => Ok(f),
        None => infer_format_from_path(path),
    };

    let ctx = ImportContext {
        path: Some(path.to_path_buf()),
        format: format.as_ref().ok().copied(),
    };

    let result = format.and_then(|format| match format {
        SourceFormat::Delimited => open_delimited(path, options, ctx.clone()),
        SourceFormat::Workbook => open_workbook(path, options, ctx.clone()),
    });
    report_failure(options, &ctx, result)
}

/// Import a workbook.
///
/// [`ImportOptions::sheet_name`] selects the sheet (case-insensitive); without it every sheet
/// is read and their rows are concatenated in workbook order. A selector that matches nothing
/// fails with [`IngestError::MissingRequiredSheet`].
///
/// Requires the `excel` feature; without it this returns [`IngestError::UnsupportedFormat`].
pub fn import_from_workbook(path: impl AsRef<Path>, options: &ImportOptions) -> IngestResult<Import> {
    let path = path.as_ref();
    let ctx = ImportContext::for_path(path, SourceFormat::Workbook);
    report_failure(options, &ctx, open_workbook(path, options, ctx.clone()))
}

fn open_workbook(path: &Path, options: &ImportOptions, ctx: ImportContext) -> IngestResult<Import> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, options, &ctx);

    #[cfg(feature = "excel")]
    {
        let table = super::workbook::load_workbook(path, options.sheet_name.as_deref())?;
        Import::prepare_with(table, options, ctx, false)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(IngestError::UnsupportedFormat {
            message: "workbook import not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

fn infer_format_from_path(path: &Path) -> IngestResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestError::UnsupportedFormat {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| IngestError::UnsupportedFormat {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

/// Owned import request, e.g. for queueing work.
#[derive(Clone, Debug)]
pub struct ImportRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling the import.
    pub options: ImportOptions,
}

impl ImportRequest {
    pub fn new(path: impl Into<PathBuf>, options: ImportOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Execute the request by calling [`import_from_path`].
    pub fn open(&self) -> IngestResult<Import> {
        import_from_path(&self.path, &self.options)
    }
}
