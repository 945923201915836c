#[cfg(feature = "excel")]
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{IngestError, IngestResult};
use crate::import::{ImportError, ImportOptions};

use super::unified::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (import aborted).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Where an import came from. Both fields are `None` for in-memory tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportContext {
    pub path: Option<PathBuf>,
    pub format: Option<SourceFormat>,
}

impl ImportContext {
    pub fn for_path(path: &Path, format: SourceFormat) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            format: Some(format),
        }
    }
}

impl fmt::Display for ImportContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.format) {
            (Some(path), Some(format)) => write!(f, "{format}:{}", path.display()),
            (Some(path), None) => write!(f, "{}", path.display()),
            (None, _) => f.write_str("<table>"),
        }
    }
}

/// Totals reported once an import has been fully consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub total: usize,
    pub imported: usize,
    pub failed: usize,
}

/// Observer interface for import outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ImportObserver: Send + Sync {
    /// Called when a run or stream has consumed every row.
    fn on_success(&self, _ctx: &ImportContext, _stats: ImportStats) {}

    /// Called when an import aborts with a structural error.
    fn on_failure(&self, _ctx: &ImportContext, _severity: ImportSeverity, _error: &IngestError) {}

    /// Called when a structural failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ImportContext, severity: ImportSeverity, error: &IngestError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called for every isolated row failure.
    fn on_row_error(&self, _ctx: &ImportContext, _error: &ImportError) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ImportObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn ImportObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ImportObserver for CompositeObserver {
    fn on_success(&self, ctx: &ImportContext, stats: ImportStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &ImportContext, severity: ImportSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ImportContext, severity: ImportSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_row_error(&self, ctx: &ImportContext, error: &ImportError) {
        for o in &self.observers {
            o.on_row_error(ctx, error);
        }
    }
}

/// Emits import events as `tracing` events; install a subscriber to see them.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ImportObserver for TracingObserver {
    fn on_success(&self, ctx: &ImportContext, stats: ImportStats) {
        info!(
            source = %ctx,
            total = stats.total,
            imported = stats.imported,
            failed = stats.failed,
            "import finished"
        );
    }

    fn on_failure(&self, ctx: &ImportContext, severity: ImportSeverity, error: &IngestError) {
        warn!(source = %ctx, ?severity, %error, "import failed");
    }

    fn on_alert(&self, ctx: &ImportContext, severity: ImportSeverity, error: &IngestError) {
        error!(source = %ctx, ?severity, %error, "import alert");
    }

    fn on_row_error(&self, ctx: &ImportContext, error: &ImportError) {
        warn!(source = %ctx, row = error.row, error = %error.message, "row rejected");
    }
}

/// Report a structural failure (and alert, past the threshold) before handing it back.
pub(crate) fn report_failure<T>(
    options: &ImportOptions,
    ctx: &ImportContext,
    result: IngestResult<T>,
) -> IngestResult<T> {
    if let (Some(obs), Err(e)) = (options.observer.as_ref(), &result) {
        let sev = severity_for_error(e);
        obs.on_failure(ctx, sev, e);
        if sev >= options.alert_at_or_above {
            obs.on_alert(ctx, sev, e);
        }
    }
    result
}

/// I/O failures are `Critical`; everything else that aborts an import is `Error`.
pub fn severity_for_error(e: &IngestError) -> ImportSeverity {
    match e {
        IngestError::Io(_) => ImportSeverity::Critical,
        IngestError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => ImportSeverity::Critical,
            _ => ImportSeverity::Error,
        },
        #[cfg(feature = "excel")]
        IngestError::Excel(err) => {
            // Best-effort: workbook errors wrap I/O inconsistently.
            if matches!(err, calamine::Error::Io(_)) || error_chain_contains_io(err) {
                ImportSeverity::Critical
            } else {
                ImportSeverity::Error
            }
        }
        IngestError::Schema(_)
        | IngestError::MissingRequiredSheet { .. }
        | IngestError::MissingRequiredColumn { .. }
        | IngestError::UnsupportedFormat { .. } => ImportSeverity::Error,
    }
}

#[cfg(feature = "excel")]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
