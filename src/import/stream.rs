//! The fault-isolated row loop.
//!
//! [`ImportStream`] pulls one prepared row at a time, normalizes it, hands it to the caller's
//! callback, and turns callback failures into [`ImportError`]s. A failing row never stops the
//! rows after it. Nothing happens until the consumer pulls; dropping the stream early leaves
//! the remaining rows unprocessed.

use tracing::{debug, warn};

use crate::ingestion::observability::ImportStats;
use crate::types::Record;

use super::normalize::row_to_record;
use super::report::{ErrorLog, ImportError, ImportSummary};
use super::{Import, PreparedRow};

/// Per-row operation: `(record, zero_based_index, one_based_row_number)`.
pub type RowCallback<'a> = Box<dyn FnMut(&Record, usize, usize) -> anyhow::Result<()> + 'a>;

/// A row that made it through normalization and the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRow {
    /// Zero-based position among the data rows.
    pub index: usize,
    /// One-based row number in the original source.
    pub row_number: usize,
    pub record: Record,
}

/// Lazy, single-pass sequence of imported rows.
///
/// Failed rows are not yielded; they are appended to [`ImportStream::error_log`] instead.
/// Call [`super::Import::stream`] again for a fresh pass.
pub struct ImportStream<'a> {
    import: &'a Import,
    rows: std::slice::Iter<'a, PreparedRow>,
    callback: Option<RowCallback<'a>>,
    attempted: usize,
    imported: usize,
    errors: ErrorLog,
    finished: bool,
}

impl<'a> ImportStream<'a> {
    pub(crate) fn new(import: &'a Import, callback: Option<RowCallback<'a>>) -> Self {
        Self {
            import,
            rows: import.rows.iter(),
            callback,
            attempted: 0,
            imported: 0,
            errors: ErrorLog::default(),
            finished: false,
        }
    }

    /// Handle to the errors collected by this stream. Complete only after the stream is drained.
    pub fn error_log(&self) -> ErrorLog {
        self.errors.clone()
    }

    /// Rows pulled so far.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Counts collected so far.
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            imported: self.imported,
            errors: self.errors.snapshot(),
            total: self.attempted,
        }
    }

    /// Drain the remaining rows and return the final summary.
    pub fn finish(mut self) -> ImportSummary {
        self.by_ref().for_each(drop);
        self.summary()
    }

    fn fail(&mut self, error: ImportError) {
        warn!(row = error.row, error = %error.message, "row failed");
        if let Some(observer) = &self.import.observer {
            observer.on_row_error(&self.import.context, &error);
        }
        self.errors.push(error);
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let stats = ImportStats {
            total: self.attempted,
            imported: self.imported,
            failed: self.errors.len(),
        };
        debug!(
            total = stats.total,
            imported = stats.imported,
            failed = stats.failed,
            "import finished"
        );
        if let Some(observer) = &self.import.observer {
            observer.on_success(&self.import.context, stats);
        }
    }
}

impl Iterator for ImportStream<'_> {
    type Item = ImportedRow;

    fn next(&mut self) -> Option<ImportedRow> {
        while let Some(prepared) = self.rows.next() {
            let index = self.attempted;
            let row_number = self.import.first_data_row + index;
            self.attempted += 1;

            let row = match prepared {
                PreparedRow::Ready(row) => row,
                PreparedRow::Rejected { message, detail } => {
                    let detail = self.import.error_detail.then(|| detail.clone());
                    self.fail(ImportError {
                        row: row_number,
                        message: message.clone(),
                        detail,
                    });
                    continue;
                }
            };

            let record = row_to_record(&self.import.header, row);
            if let Some(callback) = self.callback.as_mut() {
                if let Err(err) = callback(&record, index, row_number) {
                    let error = ImportError::from_failure(row_number, &err, self.import.error_detail);
                    self.fail(error);
                    continue;
                }
            }

            self.imported += 1;
            return Some(ImportedRow {
                index,
                row_number,
                record,
            });
        }

        self.complete();
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.rows.len()))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use anyhow::bail;

    use crate::import::{Import, ImportOptions};
    use crate::types::RawTable;

    fn numbers(n: usize) -> RawTable {
        let mut rows = vec![vec!["n".to_string()]];
        rows.extend((0..n).map(|i| vec![i.to_string()]));
        RawTable::from_strings(rows)
    }

    #[test]
    fn early_stop_leaves_later_rows_untouched() {
        let import = Import::prepare(numbers(5), &ImportOptions::default()).unwrap();
        let calls = Cell::new(0);

        let mut stream = import.stream(|_, _, _| {
            calls.set(calls.get() + 1);
            bail!("always fails")
        });
        assert!(stream.next().is_none());
        assert_eq!(calls.get(), 5);
        assert_eq!(stream.error_log().len(), 5);
        drop(stream);

        let calls = Cell::new(0);
        let mut stream = import.stream(|_, index, _| {
            calls.set(calls.get() + 1);
            if index == 0 {
                bail!("first row fails");
            }
            Ok(())
        });
        let first = stream.next().unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(stream.attempted(), 2);
        let log = stream.error_log();
        drop(stream);

        assert_eq!(calls.get(), 2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.errors()[0].row, 2);
    }

    #[test]
    fn stream_can_be_restarted() {
        let import = Import::prepare(numbers(3), &ImportOptions::default()).unwrap();
        let first: Vec<_> = import.records().map(|r| r.row_number).collect();
        let second: Vec<_> = import.records().map(|r| r.row_number).collect();
        assert_eq!(first, vec![2, 3, 4]);
        assert_eq!(first, second);
    }

    #[test]
    fn finish_drains_remaining_rows() {
        let import = Import::prepare(numbers(4), &ImportOptions::default()).unwrap();
        let mut stream = import.stream(|rec, _, _| {
            if rec.text("n") == Some("2") {
                bail!("two is not allowed");
            }
            Ok(())
        });
        let _ = stream.next();
        let summary = stream.finish();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.imported, 3);
        assert_eq!(summary.error_messages(), vec!["Row 4: two is not allowed".to_string()]);
    }
}
