//! Report assembly, console summary and JSON output.
//!
//! Two surfaces, strictly separated:
//!
//! - stdout gets exactly three summary lines, a stable contract that
//!   scripts can parse;
//! - the JSON report file gets everything, validated against the
//!   embedded schema in `schemas/report.schema.json`.
//!
//! The report is a pure function of the input records; only
//! `generated_at` differs between two runs over the same file.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::enrich::EnrichmentStats;
use crate::error::ReportResult;
use crate::kpi::Kpis;
use crate::validation::RejectionReason;

// =============================================================================
// Rejection Counters
// =============================================================================

/// How many records each rule rejected.
///
/// Field names match [`RejectionReason::as_str`] so the JSON report and
/// log lines use the same vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub wrong_field_count: usize,
    pub missing_required_field: usize,
    pub invalid_transaction_id: usize,
    pub invalid_numeric: usize,
    pub invalid_date: usize,
    pub duplicate_transaction: usize,
}

impl RejectionCounts {
    /// Count one rejection.
    pub fn record(&mut self, reason: RejectionReason) {
        match reason {
            RejectionReason::WrongFieldCount => self.wrong_field_count += 1,
            RejectionReason::MissingRequiredField => self.missing_required_field += 1,
            RejectionReason::InvalidTransactionId => self.invalid_transaction_id += 1,
            RejectionReason::InvalidNumeric => self.invalid_numeric += 1,
            RejectionReason::InvalidDate => self.invalid_date += 1,
            RejectionReason::DuplicateTransaction => self.duplicate_transaction += 1,
        }
    }

    /// Total records rejected, across all reasons.
    pub fn total(&self) -> usize {
        self.wrong_field_count
            + self.missing_required_field
            + self.invalid_transaction_id
            + self.invalid_numeric
            + self.invalid_date
            + self.duplicate_transaction
    }
}

// =============================================================================
// Validation Counts
// =============================================================================

/// Headline record accounting for one run.
///
/// `total_parsed` is always `invalid_removed + valid_after_cleaning`;
/// blank lines and header rows are in none of the three.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationCounts {
    pub total_parsed: usize,
    pub invalid_removed: usize,
    pub valid_after_cleaning: usize,
    pub rejections: RejectionCounts,
}

// =============================================================================
// Report
// =============================================================================

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub validation: ValidationCounts,
    pub enrichment: EnrichmentStats,
    pub kpis: Kpis,
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
}

impl Report {
    /// Assemble a report, stamping it with the current time.
    pub fn new(validation: ValidationCounts, enrichment: EnrichmentStats, kpis: Kpis) -> Self {
        Self {
            validation,
            enrichment,
            kpis,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

// =============================================================================
// Console Summary
// =============================================================================

/// The three stdout summary lines, in order.
pub fn summary_lines(counts: &ValidationCounts) -> [String; 3] {
    [
        format!("Total records parsed: {}", counts.total_parsed),
        format!("Invalid records removed: {}", counts.invalid_removed),
        format!("Valid records after cleaning: {}", counts.valid_after_cleaning),
    ]
}

/// Print the summary to stdout. Nothing else in the crate prints there.
pub fn print_summary(counts: &ValidationCounts) {
    for line in summary_lines(counts) {
        println!("{}", line);
    }
}

// =============================================================================
// JSON Output
// =============================================================================

/// Serialize the report as pretty-printed JSON.
pub fn to_pretty_json(report: &Report) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write the report to `path`, creating parent directories as needed.
pub fn write_json_report(report: &Report, path: &Path) -> ReportResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_pretty_json(report)?)?;
    Ok(())
}

// =============================================================================
// Schema Validation
// =============================================================================

/// Validate a serialized report against the embedded JSON schema.
///
/// # Returns
/// * `Ok(())` when the document conforms
/// * `Err(Vec<String>)` with one message per violation
pub fn validate_report_json(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/report.schema.json"))
        .expect("Invalid embedded schema");

    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check against the embedded report schema.
pub fn is_valid_report_json(data: &Value) -> bool {
    validate_report_json(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::compute_kpis;
    use crate::models::{CleanRecord, EnrichedRecord};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn sample_records() -> Vec<EnrichedRecord> {
        vec![EnrichedRecord {
            record: CleanRecord {
                transaction_id: "T1001".into(),
                date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                product_id: "P101".into(),
                product_name: "Mouse".into(),
                quantity: 2,
                unit_price: Decimal::new(1999, 2),
                customer_id: "C001".into(),
                region: "North".into(),
            },
            product: None,
        }]
    }

    fn sample_report() -> Report {
        let mut rejections = RejectionCounts::default();
        rejections.record(RejectionReason::MissingRequiredField);
        rejections.record(RejectionReason::InvalidNumeric);
        rejections.record(RejectionReason::InvalidNumeric);

        let validation = ValidationCounts {
            total_parsed: 4,
            invalid_removed: rejections.total(),
            valid_after_cleaning: 1,
            rejections,
        };
        Report::new(
            validation,
            EnrichmentStats {
                products_looked_up: 1,
                products_enriched: 0,
                lookup_failures: 1,
                records_enriched: 0,
            },
            compute_kpis(&sample_records()),
        )
    }

    #[test]
    fn test_rejection_counts_record_and_total() {
        let mut counts = RejectionCounts::default();
        counts.record(RejectionReason::WrongFieldCount);
        counts.record(RejectionReason::DuplicateTransaction);
        counts.record(RejectionReason::DuplicateTransaction);

        assert_eq!(counts.wrong_field_count, 1);
        assert_eq!(counts.duplicate_transaction, 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_summary_lines_exact_text_and_order() {
        let counts = ValidationCounts {
            total_parsed: 80,
            invalid_removed: 10,
            valid_after_cleaning: 70,
            rejections: RejectionCounts::default(),
        };
        let lines = summary_lines(&counts);
        assert_eq!(lines[0], "Total records parsed: 80");
        assert_eq!(lines[1], "Invalid records removed: 10");
        assert_eq!(lines[2], "Valid records after cleaning: 70");
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("report.json");

        write_json_report(&sample_report(), &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["validation"]["total_parsed"], 4);
        assert_eq!(value["validation"]["rejections"]["invalid_numeric"], 2);
        assert_eq!(value["kpis"]["total_orders"], 1);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_report_matches_embedded_schema() {
        let value = serde_json::to_value(sample_report()).unwrap();
        if let Err(errors) = validate_report_json(&value) {
            panic!("schema violations: {:?}", errors);
        }
    }

    #[test]
    fn test_schema_rejects_incomplete_document() {
        let mut value = serde_json::to_value(sample_report()).unwrap();
        value.as_object_mut().unwrap().remove("validation");
        assert!(!is_valid_report_json(&value));

        let mut value = serde_json::to_value(sample_report()).unwrap();
        value["validation"]
            .as_object_mut()
            .unwrap()
            .remove("rejections");
        assert!(!is_valid_report_json(&value));
    }

    #[test]
    fn test_reports_agree_modulo_timestamp() {
        let a = serde_json::to_value(sample_report()).unwrap();
        let b = serde_json::to_value(sample_report()).unwrap();
        for section in ["validation", "enrichment", "kpis"] {
            assert_eq!(a[section], b[section], "section {} differs", section);
        }
    }
}
