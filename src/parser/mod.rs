//! Pipe-delimited transaction line parser.
//!
//! Splits a decoded line into positional fields. No validation happens
//! here: the parser only annotates what it saw (field count, raw field
//! values) and leaves every judgement to the validator, so that a
//! malformed row is *counted* rather than silently dropped.
//!
//! The only lines the parser swallows are blank lines and header rows.
//! Sales exports are frequently several dumps concatenated together, so
//! a header row can reappear anywhere in the file, not just at line 1.

use crate::decoder::RawLine;

// =============================================================================
// File Layout
// =============================================================================

/// Expected columns, in positional order.
pub const EXPECTED_COLUMNS: [&str; 8] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
];

/// Number of fields a well-formed row has.
pub const EXPECTED_FIELD_COUNT: usize = EXPECTED_COLUMNS.len();

/// Field delimiter used by the export format.
pub const FIELD_DELIMITER: char = '|';

/// First cell of a header row, compared after trimming.
const HEADER_SENTINEL: &str = "TransactionID";

// =============================================================================
// Candidate Record
// =============================================================================

/// A non-blank, non-header line split into raw fields.
///
/// Field values are exactly as they appeared in the file: no trimming,
/// no type conversion. Accessors return `None` when the row is too
/// short to have that column at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    line: usize,
    fields: Vec<String>,
}

impl CandidateRecord {
    /// Build a candidate directly from raw fields.
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// 1-based physical line this candidate came from.
    pub fn line(&self) -> usize {
        self.line
    }

    /// How many `|`-separated fields the line actually had.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether the line had exactly the expected number of fields.
    pub fn has_expected_field_count(&self) -> bool {
        self.fields.len() == EXPECTED_FIELD_COUNT
    }

    fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Raw `TransactionID` field.
    pub fn transaction_id(&self) -> Option<&str> {
        self.field(0)
    }

    /// Raw `Date` field.
    pub fn date(&self) -> Option<&str> {
        self.field(1)
    }

    /// Raw `ProductID` field.
    pub fn product_id(&self) -> Option<&str> {
        self.field(2)
    }

    /// Raw `ProductName` field.
    pub fn product_name(&self) -> Option<&str> {
        self.field(3)
    }

    /// Raw `Quantity` field.
    pub fn quantity(&self) -> Option<&str> {
        self.field(4)
    }

    /// Raw `UnitPrice` field.
    pub fn unit_price(&self) -> Option<&str> {
        self.field(5)
    }

    /// Raw `CustomerID` field.
    pub fn customer_id(&self) -> Option<&str> {
        self.field(6)
    }

    /// Raw `Region` field.
    pub fn region(&self) -> Option<&str> {
        self.field(7)
    }
}

// =============================================================================
// Line Parsing
// =============================================================================

/// Split one decoded line into a candidate record.
///
/// Returns `None` for blank lines and header rows; those are structural
/// noise, not records, and do not count towards any total. Everything
/// else becomes a candidate, however malformed.
///
/// # Example
/// ```ignore
/// let line = RawLine { number: 4, text: "T1001|2024-12-01|P101|Mouse|2|19.99|C001|North".into() };
/// let record = parse_line(&line).unwrap();
/// assert_eq!(record.transaction_id(), Some("T1001"));
/// ```
pub fn parse_line(raw: &RawLine) -> Option<CandidateRecord> {
    if raw.text.trim().is_empty() {
        return None;
    }

    let fields: Vec<String> = raw
        .text
        .split(FIELD_DELIMITER)
        .map(str::to_string)
        .collect();

    // Header rows can recur mid-file in concatenated exports
    if fields.first().map(|f| f.trim()) == Some(HEADER_SENTINEL) {
        return None;
    }

    Some(CandidateRecord::new(raw.number, fields))
}
