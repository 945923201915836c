//! Delimited text (CSV/TSV) loading.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::IngestResult;
use crate::import::{Import, ImportOptions};
use crate::types::{RawTable, Value};

use super::encoding::{decode_text, detect_delimiter};
use super::observability::{report_failure, ImportContext};
use super::unified::SourceFormat;

/// Import a delimited text file of unknown encoding and separator.
///
/// Behavior:
/// - Decodes the file to UTF-8 (see [`super::encoding`]) and drops a leading byte-order mark
/// - Splits on tabs if the text contains any tab, otherwise on commas
/// - Lowercases header names unless [`ImportOptions::lowercase_headers`] is `Some(false)`
/// - [`ImportOptions::sheet_name`] is ignored
pub fn import_from_delimited_text(path: impl AsRef<Path>, options: &ImportOptions) -> IngestResult<Import> {
    let path = path.as_ref();
    let ctx = ImportContext::for_path(path, SourceFormat::Delimited);
    report_failure(options, &ctx, open_delimited(path, options, ctx.clone()))
}

pub(crate) fn open_delimited(path: &Path, options: &ImportOptions, ctx: ImportContext) -> IngestResult<Import> {
    let table = load_delimited_text(path)?;
    Import::prepare_with(table, options, ctx, true)
}

/// Read and tokenize a delimited text file into a [`RawTable`].
pub fn load_delimited_text(path: impl AsRef<Path>) -> IngestResult<RawTable> {
    let bytes = fs::read(path)?;
    parse_delimited_bytes(&bytes)
}

/// Decode and tokenize raw delimited text.
pub fn parse_delimited_bytes(bytes: &[u8]) -> IngestResult<RawTable> {
    let decoded = decode_text(bytes);
    debug!(
        encoding = decoded.encoding.name(),
        bom = decoded.had_bom,
        bytes = bytes.len(),
        "decoded delimited text"
    );
    parse_delimited_str(&decoded.text)
}

/// Tokenize already-decoded text. Empty fields become [`Value::Null`].
///
/// Blank source lines are kept as empty rows so table positions line up with source lines.
pub fn parse_delimited_str(text: &str) -> IngestResult<RawTable> {
    let delimiter = detect_delimiter(text);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let bytes = text.as_bytes();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut lines = LineCounter::default();
    for result in rdr.records() {
        let record = result?;
        let line = match record.position() {
            Some(pos) => lines.line_at(bytes, pos.byte() as usize),
            None => rows.len() + 1,
        };
        // The tokenizer skips blank lines; pad them back in.
        while rows.len() + 1 < line {
            rows.push(Vec::new());
        }
        rows.push(record.iter().map(cell_value).collect());
    }

    debug!(
        delimiter = %(delimiter as char).escape_default(),
        rows = rows.len(),
        "tokenized delimited text"
    );
    Ok(RawTable::new(rows))
}

/// Maps record byte offsets to 1-based source lines, scanning forward only.
///
/// `\n`, `\r\n` and a lone `\r` each end one line.
#[derive(Debug)]
struct LineCounter {
    offset: usize,
    line: usize,
}

impl Default for LineCounter {
    fn default() -> Self {
        Self { offset: 0, line: 1 }
    }
}

impl LineCounter {
    /// Line on which the record reported at `byte` starts.
    ///
    /// The reported offset may sit before the blank lines the tokenizer skipped, so leading
    /// line terminators are stepped over first. Offsets must not decrease between calls.
    fn line_at(&mut self, bytes: &[u8], byte: usize) -> usize {
        let mut start = byte.clamp(self.offset, bytes.len());
        while matches!(bytes.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }

        let mut iter = bytes[self.offset..start].iter().peekable();
        while let Some(&b) = iter.next() {
            match b {
                b'\n' => self.line += 1,
                b'\r' if iter.peek() != Some(&&b'\n') => self.line += 1,
                _ => {}
            }
        }
        self.offset = start;
        self.line
    }
}

fn cell_value(raw: &str) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::Utf8(raw.to_owned())
    }
}
