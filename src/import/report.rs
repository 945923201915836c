use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

/// A captured per-row failure.
///
/// `row` is the 1-based row number in the original source, intro rows and header included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    pub row: usize,
    pub message: String,
    /// Full diagnostic (cause chain, backtrace when captured); only set when
    /// [`super::ImportOptions::error_detail`] is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ImportError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
            detail: None,
        }
    }

    pub(crate) fn from_failure(row: usize, err: &anyhow::Error, detail: bool) -> Self {
        Self {
            row,
            message: err.to_string(),
            detail: detail.then(|| format!("{err:?}")),
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n{detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ImportError {}

/// Outcome of an eagerly-run import.
///
/// `imported + errors.len() == total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Rows whose callback succeeded.
    pub imported: usize,
    /// Failed rows, in row order.
    pub errors: Vec<ImportError>,
    /// Rows attempted.
    pub total: usize,
}

impl ImportSummary {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error lines as `Row N: message`.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Append-only error collection shared between an [`super::ImportStream`] and its caller.
///
/// The contents are only complete once the stream has been drained.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    inner: Rc<RefCell<Vec<ImportError>>>,
}

impl ErrorLog {
    pub(crate) fn push(&self, error: ImportError) {
        self.inner.borrow_mut().push(error);
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Borrow the errors recorded so far.
    pub fn errors(&self) -> Ref<'_, Vec<ImportError>> {
        self.inner.borrow()
    }

    /// Copy of the errors recorded so far.
    pub fn snapshot(&self) -> Vec<ImportError> {
        self.inner.borrow().clone()
    }
}
