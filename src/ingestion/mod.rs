//! Source loading and import entrypoints.
//!
//! Most callers should use [`import_from_path`] (from [`unified`]) which:
//!
//! - picks the loader by file extension (or via [`crate::import::ImportOptions::format`])
//! - loads the source into a [`crate::types::RawTable`] and prepares an [`crate::import::Import`]
//! - optionally reports failures/alerts to an [`ImportObserver`]
//!
//! Format-specific entrypoints are also available:
//! - [`import_from_delimited_text`] ([`delimited`], with detection helpers in [`encoding`])
//! - [`import_from_workbook`] (loader in `workbook`, behind the `excel` feature)

pub mod delimited;
pub mod encoding;
pub mod observability;
pub mod unified;
#[cfg(feature = "excel")]
pub mod workbook;

pub use delimited::import_from_delimited_text;
pub use observability::{
    CompositeObserver, ImportContext, ImportObserver, ImportSeverity, ImportStats, TracingObserver,
};
pub use unified::{import_from_path, import_from_workbook, ImportRequest, SourceFormat};
