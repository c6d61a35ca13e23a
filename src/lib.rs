//! # Salescrub - Sales transaction cleaning and KPI reporting
//!
//! Salescrub ingests pipe-delimited sales exports with unreliable encodings,
//! validates every transaction against fixed business rules, enriches valid
//! records from a remote product catalog, and emits a JSON report combining
//! cleaning statistics with revenue KPIs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Sales Export│────▶│  Decoder +  │────▶│ Validator + │────▶│ JSON Report │
//! │ (mixed enc) │     │   Parser    │     │  Enricher   │     │   (KPIs)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salescrub::{process_file, print_summary, HttpProductCatalog};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let catalog = HttpProductCatalog::from_env();
//!     let report = process_file(Path::new("sales.txt"), &catalog).await.unwrap();
//!     print_summary(&report.validation);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (CleanRecord, EnrichedRecord, ProductInfo)
//! - [`decoder`] - Encoding detection and per-line decoding
//! - [`parser`] - Pipe-delimited field splitting
//! - [`validation`] - Business-rule validation and rejection reasons
//! - [`catalog`] - Product catalog lookups (HTTP client + static fake)
//! - [`enrich`] - Concurrent catalog enrichment
//! - [`kpi`] - KPI aggregation over enriched records
//! - [`report`] - Report assembly, console summary, schema validation
//! - [`pipeline`] - End-to-end pipeline

// Core modules
pub mod error;
pub mod models;

// Input handling
pub mod decoder;
pub mod parser;

// Validation
pub mod validation;

// Enrichment
pub mod catalog;
pub mod enrich;

// Reporting
pub mod kpi;
pub mod report;

// Pipeline
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CatalogError,
    CatalogResult,
    PipelineError,
    PipelineResult,
    ReportError,
    ReportResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CleanRecord,
    EnrichedRecord,
    ProductInfo,
};

// =============================================================================
// Re-exports - Decoding
// =============================================================================

pub use decoder::{
    decoded_lines,
    detect_encoding,
    DecodedLines,
    RawLine,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    parse_line,
    CandidateRecord,
    EXPECTED_COLUMNS,
    EXPECTED_FIELD_COUNT,
    FIELD_DELIMITER,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    RejectionReason,
    ValidationResult,
    Validator,
    DATE_FORMATS,
};

// =============================================================================
// Re-exports - Catalog
// =============================================================================

pub use catalog::{
    HttpProductCatalog,
    ProductCatalog,
    StaticProductCatalog,
    CATALOG_URL_ENV,
    DEFAULT_CATALOG_URL,
};

// =============================================================================
// Re-exports - Enrichment
// =============================================================================

pub use enrich::{enrich_records, EnrichmentStats, LOOKUP_CONCURRENCY};

// =============================================================================
// Re-exports - KPIs
// =============================================================================

pub use kpi::{
    compute_kpis,
    CategoryRevenue,
    CustomerSpend,
    DailyRevenue,
    Kpis,
    PeakSalesDay,
    ProductSales,
    RegionRevenue,
    LOW_QUANTITY_THRESHOLD,
    TOP_CUSTOMERS_LIMIT,
    TOP_PRODUCTS_LIMIT,
};

// =============================================================================
// Re-exports - Report
// =============================================================================

pub use report::{
    is_valid_report_json,
    print_summary,
    summary_lines,
    to_pretty_json,
    validate_report_json,
    write_json_report,
    RejectionCounts,
    Report,
    ValidationCounts,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{process_bytes, process_file};
