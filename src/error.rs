use thiserror::Error;

/// Convenience result type for import operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Structural error returned by import functions.
///
/// These abort an import before any row is attempted. Failures of individual rows are never
/// reported through this type; they are collected as [`crate::import::ImportError`] values.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook parsing error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Delimited text tokenizing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A schema configuration document could not be parsed.
    #[error("schema config error: {0}")]
    Schema(#[from] serde_json::Error),

    /// A sheet selector matched no sheet in the workbook.
    #[error("spreadsheet must include a sheet named '{sheet}'")]
    MissingRequiredSheet { sheet: String },

    /// A required column is absent from the header row.
    #[error("spreadsheet must include a '{column}' column")]
    MissingRequiredColumn { column: String },

    /// The source format could not be determined or is not compiled in.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },
}
