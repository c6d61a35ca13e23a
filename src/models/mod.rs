//! Domain models for the salescrub cleaning pipeline.
//!
//! This module contains the core data structures passed between stages:
//!
//! - [`CleanRecord`] - a transaction that survived validation, fully typed
//! - [`ProductInfo`] - catalog metadata for a product
//! - [`EnrichedRecord`] - a clean record paired with its catalog match
//!
//! Monetary amounts use [`Decimal`] end to end so that accumulation is
//! exact; rounding to two decimal places happens once, at report time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Clean Record
// =============================================================================

/// A sales transaction that passed every validation rule.
///
/// All fields are already trimmed and typed. `product_name` is the only
/// field allowed to be empty, because catalog enrichment can fill it in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanRecord {
    /// Transaction identifier, e.g. `T1001`.
    pub transaction_id: String,
    /// Transaction date, normalized to a calendar date.
    pub date: NaiveDate,
    /// Product identifier as it appeared in the input, e.g. `P101`.
    pub product_id: String,
    /// Product name from the input (may be empty).
    pub product_name: String,
    /// Units sold (at least 1).
    pub quantity: i64,
    /// Price per unit (strictly positive).
    pub unit_price: Decimal,
    /// Customer identifier.
    pub customer_id: String,
    /// Sales region.
    pub region: String,
}

impl CleanRecord {
    /// Revenue contributed by this transaction (`quantity * unit_price`).
    pub fn revenue(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

// =============================================================================
// Product Info
// =============================================================================

/// Product metadata fetched from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductInfo {
    /// Product identifier as it appears in the transaction file.
    pub product_id: String,
    /// Catalog product name.
    pub name: String,
    /// Catalog category.
    pub category: String,
}

// =============================================================================
// Enriched Record
// =============================================================================

/// A clean record together with its catalog match, if any.
///
/// Enrichment is best-effort: a missing match never invalidates the
/// record, it only changes which category the record is counted under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRecord {
    /// The validated transaction.
    pub record: CleanRecord,
    /// Catalog metadata, `None` when the lookup found nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductInfo>,
}

impl EnrichedRecord {
    /// Whether the catalog lookup produced a match.
    pub fn is_enriched(&self) -> bool {
        self.product.is_some()
    }

    /// Category to aggregate this record under.
    ///
    /// Falls back to the raw product id when no catalog match exists, so
    /// un-enriched revenue stays visible instead of vanishing into an
    /// "unknown" bucket.
    pub fn category(&self) -> &str {
        match &self.product {
            Some(product) => &product.category,
            None => &self.record.product_id,
        }
    }

    /// Best available display name for the product.
    ///
    /// Prefers the catalog name, then the name from the input file.
    pub fn product_label(&self) -> Option<&str> {
        if let Some(product) = &self.product {
            return Some(&product.name);
        }
        if self.record.product_name.is_empty() {
            None
        } else {
            Some(&self.record.product_name)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
