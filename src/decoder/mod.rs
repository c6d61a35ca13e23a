//! Byte-level line splitting with per-line encoding recovery.
//!
//! Real-world sales exports are concatenations of dumps from different
//! systems, so a single file can mix UTF-8 with legacy single-byte
//! encodings. Splitting on `\n` happens on raw bytes *before* any
//! decoding: `0x0A` never appears inside a multi-byte sequence of the
//! encodings handled here, so one undecodable line can never swallow
//! its neighbours.
//!
//! Each line is decoded independently: strict UTF-8 first, then the
//! file-level encoding detected by chardet as fallback. Undecodable
//! bytes become U+FFFD replacement characters instead of aborting the
//! run.

use encoding_rs::Encoding;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// =============================================================================
// Raw Line
// =============================================================================

/// One physical line of the input file, decoded to text.
///
/// `number` is 1-based and counts every physical line, including blank
/// ones, so downstream diagnostics can point back into the raw file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based physical line number.
    pub number: usize,
    /// Decoded line content, without the trailing `\n` or `\r\n`.
    pub text: String,
}

// =============================================================================
// Encoding Detection
// =============================================================================

/// Detect the dominant encoding of raw bytes using chardet.
///
/// The detected charset name is normalized onto an [`encoding_rs`]
/// decoder. Unknown charsets fall back to Windows-1252, which decodes
/// every byte sequence to *something* and keeps the run alive.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let detected = chardet::detect(bytes);
    let charset = detected.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => encoding_rs::UTF_8,
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15,
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252,
        other => Encoding::for_label(other.as_bytes()).unwrap_or(encoding_rs::WINDOWS_1252),
    }
}

/// Decode a single line: strict UTF-8 first, then the fallback encoding.
fn decode_line(bytes: &[u8], fallback: &'static Encoding) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _had_errors) = fallback.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}

// =============================================================================
// Decoded Lines Iterator
// =============================================================================

/// Lazy iterator over the decoded lines of a byte buffer.
///
/// Produced by [`decoded_lines`]. Finite, and restartable by calling
/// [`decoded_lines`] again on the same buffer.
#[derive(Debug, Clone)]
pub struct DecodedLines<'a> {
    bytes: &'a [u8],
    fallback: &'static Encoding,
    pos: usize,
    next_number: usize,
}

impl<'a> DecodedLines<'a> {
    /// Encoding used as fallback for lines that are not valid UTF-8.
    pub fn fallback_encoding(&self) -> &'static Encoding {
        self.fallback
    }
}

impl<'a> Iterator for DecodedLines<'a> {
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        if self.pos >= self.bytes.len() {
            return None;
        }

        let rest = &self.bytes[self.pos..];
        let (line_bytes, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(newline) => (&rest[..newline], newline + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;

        let line_bytes = line_bytes.strip_suffix(b"\r").unwrap_or(line_bytes);
        let number = self.next_number;
        self.next_number += 1;

        Some(RawLine {
            number,
            text: decode_line(line_bytes, self.fallback),
        })
    }
}

/// Split raw bytes into decoded lines.
///
/// A UTF-8 BOM at the start of the buffer is stripped before anything
/// else. A trailing `\n` does not produce an extra empty line; blank
/// lines in the middle of the file do come through (the parser skips
/// them, but they still advance the line counter).
///
/// # Example
/// ```ignore
/// let bytes = std::fs::read("sales_2024.txt")?;
/// for line in decoded_lines(&bytes) {
///     println!("{}: {}", line.number, line.text);
/// }
/// ```
pub fn decoded_lines(bytes: &[u8]) -> DecodedLines<'_> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    DecodedLines {
        bytes,
        fallback: detect_encoding(bytes),
        pos: 0,
        next_number: 1,
    }
}
