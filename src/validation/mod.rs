//! Record validation rules and duplicate tracking.
//!
//! Every candidate record is checked against the rules below, in a
//! fixed priority order. The first rule that fails decides the single
//! [`RejectionReason`] attached to the record; later rules are not
//! evaluated, so each invalid record is counted exactly once.
//!
//! Priority order:
//!
//! 1. [`RejectionReason::WrongFieldCount`]
//! 2. [`RejectionReason::MissingRequiredField`]
//! 3. [`RejectionReason::InvalidTransactionId`]
//! 4. [`RejectionReason::InvalidNumeric`]
//! 5. [`RejectionReason::InvalidDate`]
//! 6. [`RejectionReason::DuplicateTransaction`]
//!
//! Duplicate detection is stateful, which is why validation goes
//! through a [`Validator`] value: only *accepted* transaction ids are
//! registered, so two copies of a broken record are both rejected for
//! the broken field, not one for the field and one as a duplicate.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::CleanRecord;
use crate::parser::CandidateRecord;

// =============================================================================
// Validation Rules
// =============================================================================

/// Transaction ids must start with this prefix.
const TRANSACTION_ID_PREFIX: &str = "T";

/// Smallest quantity that still describes a sale.
const MIN_QUANTITY: i64 = 1;

/// Accepted date formats, tried in order. The first one is the
/// canonical form records are normalized to.
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];

// =============================================================================
// Rejection Reasons
// =============================================================================

/// Why a candidate record was rejected.
///
/// Reasons are mutually exclusive; the variant order mirrors the
/// priority order in which rules are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The line did not split into exactly the expected field count.
    WrongFieldCount,
    /// A required field was empty or whitespace-only.
    MissingRequiredField,
    /// The transaction id does not start with `T`.
    InvalidTransactionId,
    /// Quantity or unit price failed to parse, or was out of range.
    InvalidNumeric,
    /// The date matched none of the accepted formats.
    InvalidDate,
    /// The transaction id was already accepted earlier in this run.
    DuplicateTransaction,
}

impl RejectionReason {
    /// Stable snake_case name, as used in the JSON report.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WrongFieldCount => "wrong_field_count",
            Self::MissingRequiredField => "missing_required_field",
            Self::InvalidTransactionId => "invalid_transaction_id",
            Self::InvalidNumeric => "invalid_numeric",
            Self::InvalidDate => "invalid_date",
            Self::DuplicateTransaction => "duplicate_transaction",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one candidate record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The record passed every rule and is ready for enrichment.
    Valid(CleanRecord),
    /// The record failed; the reason is the first rule that rejected it.
    Invalid(RejectionReason),
}

// =============================================================================
// Validator
// =============================================================================

/// Stateful record validator for a single pipeline run.
///
/// Holds the set of transaction ids accepted so far. Create a fresh
/// validator per run; duplicate state never leaks across runs.
#[derive(Debug, Default)]
pub struct Validator {
    seen_transactions: HashSet<String>,
}

impl Validator {
    /// Create a validator with an empty duplicate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate one candidate against all rules, in priority order.
    pub fn validate(&mut self, candidate: &CandidateRecord) -> ValidationResult {
        use RejectionReason::*;

        if !candidate.has_expected_field_count() {
            return ValidationResult::Invalid(WrongFieldCount);
        }

        // Field count is right, so every accessor yields a value
        let transaction_id = candidate.transaction_id().unwrap_or_default().trim();
        let date_raw = candidate.date().unwrap_or_default().trim();
        let product_id = candidate.product_id().unwrap_or_default().trim();
        let product_name = candidate.product_name().unwrap_or_default().trim();
        let quantity_raw = candidate.quantity().unwrap_or_default().trim();
        let unit_price_raw = candidate.unit_price().unwrap_or_default().trim();
        let customer_id = candidate.customer_id().unwrap_or_default().trim();
        let region = candidate.region().unwrap_or_default().trim();

        // Every field except ProductName is required
        let required = [
            transaction_id,
            date_raw,
            product_id,
            quantity_raw,
            unit_price_raw,
            customer_id,
            region,
        ];
        if required.iter().any(|field| field.is_empty()) {
            return ValidationResult::Invalid(MissingRequiredField);
        }

        if !transaction_id.starts_with(TRANSACTION_ID_PREFIX) {
            return ValidationResult::Invalid(InvalidTransactionId);
        }

        let Some(quantity) = parse_quantity(quantity_raw) else {
            return ValidationResult::Invalid(InvalidNumeric);
        };
        let Some(unit_price) = parse_unit_price(unit_price_raw) else {
            return ValidationResult::Invalid(InvalidNumeric);
        };

        let Some(date) = parse_date(date_raw) else {
            return ValidationResult::Invalid(InvalidDate);
        };

        if self.seen_transactions.contains(transaction_id) {
            return ValidationResult::Invalid(DuplicateTransaction);
        }
        self.seen_transactions.insert(transaction_id.to_string());

        ValidationResult::Valid(CleanRecord {
            transaction_id: transaction_id.to_string(),
            date,
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            quantity,
            unit_price,
            customer_id: customer_id.to_string(),
            region: region.to_string(),
        })
    }
}

// =============================================================================
// Field Parsers
// =============================================================================

/// Drop thousands separators, as in `1,299.50`.
fn strip_separators(raw: &str) -> String {
    raw.replace(',', "")
}

fn parse_quantity(raw: &str) -> Option<i64> {
    let quantity = strip_separators(raw).parse::<i64>().ok()?;
    (quantity >= MIN_QUANTITY).then_some(quantity)
}

fn parse_unit_price(raw: &str) -> Option<Decimal> {
    let price = strip_separators(raw).parse::<Decimal>().ok()?;
    (price > Decimal::ZERO).then_some(price)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}
