//! High-level pipeline API: decode, parse, validate, enrich, aggregate.
//!
//! One pass over the input, start to finish. Malformed records are
//! folded into the rejection counters and never abort the run; the only
//! fatal condition is an input file that cannot be read at all.
//!
//! # Example
//!
//! ```rust,ignore
//! use salescrub::catalog::HttpProductCatalog;
//! use salescrub::pipeline::process_file;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = HttpProductCatalog::from_env();
//!     let report = process_file(Path::new("sales_2024.txt"), &catalog).await?;
//!     println!("{} valid records", report.validation.valid_after_cleaning);
//!     Ok(())
//! }
//! ```

use std::path::Path;

use tracing::{debug, info};

use crate::catalog::ProductCatalog;
use crate::decoder;
use crate::enrich::enrich_records;
use crate::error::{PipelineError, PipelineResult};
use crate::kpi::compute_kpis;
use crate::parser;
use crate::report::{RejectionCounts, Report, ValidationCounts};
use crate::validation::{ValidationResult, Validator};

/// Run the full pipeline over a file on disk.
///
/// This is the main entry point. It:
/// 1. Reads the file as raw bytes
/// 2. Splits and decodes lines, recovering from mixed encodings
/// 3. Validates every candidate record, counting rejections
/// 4. Enriches valid records from the product catalog
/// 5. Aggregates KPIs and assembles the report
pub async fn process_file<C>(path: &Path, catalog: &C) -> PipelineResult<Report>
where
    C: ProductCatalog + ?Sized,
{
    let bytes = std::fs::read(path).map_err(|source| PipelineError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(process_bytes(&bytes, catalog).await)
}

/// Same as [`process_file`], but over bytes already in memory.
pub async fn process_bytes<C>(bytes: &[u8], catalog: &C) -> Report
where
    C: ProductCatalog + ?Sized,
{
    // Fresh validator per run: duplicate state must not outlive the run
    let mut validator = Validator::new();
    let mut rejections = RejectionCounts::default();
    let mut clean = Vec::new();
    let mut total_parsed = 0usize;

    for raw in decoder::decoded_lines(bytes) {
        let Some(candidate) = parser::parse_line(&raw) else {
            continue;
        };
        total_parsed += 1;

        match validator.validate(&candidate) {
            ValidationResult::Valid(record) => clean.push(record),
            ValidationResult::Invalid(reason) => {
                debug!(line = candidate.line(), %reason, "record rejected");
                rejections.record(reason);
            }
        }
    }

    let validation = ValidationCounts {
        total_parsed,
        invalid_removed: rejections.total(),
        valid_after_cleaning: clean.len(),
        rejections,
    };
    info!(
        total_parsed = validation.total_parsed,
        invalid_removed = validation.invalid_removed,
        valid_after_cleaning = validation.valid_after_cleaning,
        "validation finished"
    );

    let (enriched, enrichment) = enrich_records(clean, catalog).await;
    info!(
        products_looked_up = enrichment.products_looked_up,
        products_enriched = enrichment.products_enriched,
        lookup_failures = enrichment.lookup_failures,
        "enrichment finished"
    );

    let kpis = compute_kpis(&enriched);

    Report::new(validation, enrichment, kpis)
}
