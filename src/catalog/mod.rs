//! Product catalog lookups.
//!
//! Enrichment metadata (canonical product name, category) comes from an
//! HTTP product catalog. The catalog is behind the [`ProductCatalog`]
//! trait so the pipeline and its tests can run against an in-memory
//! catalog instead of the network.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salescrub::catalog::{HttpProductCatalog, ProductCatalog};
//!
//! let catalog = HttpProductCatalog::from_env();
//! let product = catalog.lookup("P101").await?;
//! ```

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::models::ProductInfo;

// =============================================================================
// Configuration
// =============================================================================

/// Catalog endpoint used when `PRODUCT_CATALOG_URL` is not set.
pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products";

/// Environment variable overriding the catalog endpoint.
pub const CATALOG_URL_ENV: &str = "PRODUCT_CATALOG_URL";

/// Per-request timeout.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after the first failed attempt.
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay between retries; doubles after every failed attempt.
const RETRY_BACKOFF_MS: u64 = 500;

const USER_AGENT_VALUE: &str = concat!("salescrub/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Catalog Trait
// =============================================================================

/// Source of product metadata, keyed by the raw product id from the
/// transaction file.
///
/// `Ok(None)` means the catalog has no such product; `Err` means the
/// catalog could not answer at all. Both are non-fatal to the pipeline.
#[async_trait]
pub trait ProductCatalog {
    /// Look up one product by its raw id, e.g. `P101`.
    async fn lookup(&self, product_id: &str) -> CatalogResult<Option<ProductInfo>>;
}

// =============================================================================
// HTTP Catalog Client
// =============================================================================

/// Catalog client for dummyjson-style product APIs.
///
/// The raw product id is reduced to its digits to form the endpoint id,
/// so `P101` resolves to `<base>/101`. Ids without digits are treated
/// as not found without touching the network.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

/// Catalog API response structure (only the fields we keep).
#[derive(Debug, Deserialize)]
struct CatalogProduct {
    title: String,
    category: String,
}

impl HttpProductCatalog {
    /// Create a client for an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a client from the `PRODUCT_CATALOG_URL` environment
    /// variable, falling back to [`DEFAULT_CATALOG_URL`].
    pub fn from_env() -> Self {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        let base_url =
            env::var(CATALOG_URL_ENV).unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());
        Self::new(base_url)
    }

    /// Set the number of retries after the first failed attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Single lookup attempt, no retries.
    async fn fetch_product(&self, numeric_id: u64) -> CatalogResult<Option<CatalogProduct>> {
        let url = product_url(&self.base_url, numeric_id);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT_VALUE)
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .map_err(|e| CatalogError::HttpError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status().as_u16()));
        }

        let product = response
            .json::<CatalogProduct>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        Ok(Some(product))
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn lookup(&self, product_id: &str) -> CatalogResult<Option<ProductInfo>> {
        let Some(numeric_id) = extract_numeric_id(product_id) else {
            debug!(product_id, "product id has no digits, skipping lookup");
            return Ok(None);
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.fetch_product(numeric_id).await {
                Ok(product) => {
                    return Ok(product.map(|p| ProductInfo {
                        product_id: product_id.to_string(),
                        name: p.title,
                        category: p.category,
                    }))
                }
                Err(e) => {
                    warn!(product_id, attempt, error = %e, "catalog lookup attempt failed");
                    last_error = Some(e);

                    if attempt < self.max_retries {
                        tokio::time::sleep(backoff_for(attempt)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CatalogError::HttpError("retries exhausted".to_string())))
    }
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// Fixed in-memory catalog.
///
/// Useful for tests and for running the pipeline without network
/// access: an empty catalog makes every lookup a miss, which the
/// pipeline treats as "keep the record, fall back on the raw id".
#[derive(Debug, Clone, Default)]
pub struct StaticProductCatalog {
    products: HashMap<String, ProductInfo>,
}

impl StaticProductCatalog {
    /// Catalog that knows no products.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with fixed products, keyed by their raw id.
    pub fn with_products(products: impl IntoIterator<Item = ProductInfo>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|p| (p.product_id.clone(), p))
                .collect(),
        }
    }
}

#[async_trait]
impl ProductCatalog for StaticProductCatalog {
    async fn lookup(&self, product_id: &str) -> CatalogResult<Option<ProductInfo>> {
        Ok(self.products.get(product_id).cloned())
    }
}

// =============================================================================
// Helpers
// =============================================================================

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex literal"));

/// Reduce a raw product id to the numeric id the catalog API expects.
///
/// All non-digit characters are dropped, so `P101` becomes `101` and
/// `SKU-12-34` becomes `1234`. Returns `None` when nothing is left.
fn extract_numeric_id(product_id: &str) -> Option<u64> {
    let digits = NON_DIGITS.replace_all(product_id, "");
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok()
}

fn product_url(base_url: &str, numeric_id: u64) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), numeric_id)
}

fn backoff_for(attempt: u32) -> Duration {
    Duration::from_millis(RETRY_BACKOFF_MS << attempt)
}
