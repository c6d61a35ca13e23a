//! Error types for the salescrub cleaning pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CatalogError`] - product catalog lookup errors
//! - [`ReportError`] - report serialization and output errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Malformed *records* are never errors: they are folded into the
//! rejection counters and the run keeps going. Only an unreadable
//! input file aborts a run.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors from the product catalog client.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Catalog answered with a non-success status other than 404.
    #[error("Catalog returned HTTP {0}")]
    HttpStatus(u16),

    /// Response body did not match the expected product shape.
    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while writing the JSON report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// IO error.
    #[error("Report IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Report JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::process_file`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input file could not be read at all.
    #[error("Failed to read input file '{}': {}", .path.display(), .source)]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Report error.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
