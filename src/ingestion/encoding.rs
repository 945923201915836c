//! Character-encoding and separator detection for delimited text.
//!
//! Detection order:
//!
//! 1. a byte-order mark selects UTF-8, UTF-16LE or UTF-16BE,
//! 2. otherwise the bytes are used as UTF-8 if they are valid UTF-8,
//! 3. otherwise they are decoded as Windows-1252 (a superset of ISO-8859-1 for printable text).
//!
//! Any U+FEFF left at the start of the decoded text is removed.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Text normalized to UTF-8, with the encoding it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// Whether the input started with a byte-order mark.
    pub had_bom: bool,
}

/// Decode raw file contents into UTF-8 text.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    let (text, encoding, had_bom) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            (text, encoding, true)
        }
        None => match std::str::from_utf8(bytes) {
            Ok(s) => (Cow::Borrowed(s), UTF_8, false),
            Err(_) => {
                let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
                (text, WINDOWS_1252, false)
            }
        },
    };

    let text = text.strip_prefix('\u{feff}').unwrap_or(&*text).to_owned();
    DecodedText {
        text,
        encoding,
        had_bom,
    }
}

/// Tab if the text contains any tab character, comma otherwise.
pub fn detect_delimiter(text: &str) -> u8 {
    if text.contains('\t') { b'\t' } else { b',' }
}
