//! Best-effort catalog enrichment of clean records.
//!
//! Product ids are deduplicated before hitting the catalog, so a file
//! with ten thousand sales of `P101` costs one lookup. Lookups run
//! concurrently but bounded, and one failed lookup never poisons the
//! others: the affected records simply stay un-enriched and get
//! counted in [`EnrichmentStats::lookup_failures`].

use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::ProductCatalog;
use crate::models::{CleanRecord, EnrichedRecord, ProductInfo};

/// How many catalog lookups may be in flight at once.
pub const LOOKUP_CONCURRENCY: usize = 4;

// =============================================================================
// Enrichment Stats
// =============================================================================

/// Counters describing one enrichment pass.
///
/// `products_looked_up` counts unique product ids;
/// `products_enriched + lookup_failures` always equals it.
/// `records_enriched` counts records, not products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentStats {
    /// Unique product ids sent to the catalog.
    pub products_looked_up: usize,
    /// Unique product ids that came back with metadata.
    pub products_enriched: usize,
    /// Unique product ids that came back empty or errored.
    pub lookup_failures: usize,
    /// Records that ended up carrying catalog metadata.
    pub records_enriched: usize,
}

// =============================================================================
// Enrichment Pass
// =============================================================================

/// Attach catalog metadata to every record that has a catalog match.
///
/// Every input record comes back, in input order; enrichment can only
/// add information, never drop a record.
pub async fn enrich_records<C>(
    records: Vec<CleanRecord>,
    catalog: &C,
) -> (Vec<EnrichedRecord>, EnrichmentStats)
where
    C: ProductCatalog + ?Sized,
{
    let product_ids = unique_product_ids(&records);
    let mut stats = EnrichmentStats {
        products_looked_up: product_ids.len(),
        ..Default::default()
    };

    let results = stream::iter(product_ids)
        .map(|product_id| async move {
            let result = catalog.lookup(&product_id).await;
            (product_id, result)
        })
        .buffered(LOOKUP_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

    let mut found: HashMap<String, ProductInfo> = HashMap::new();
    for (product_id, result) in results {
        match result {
            Ok(Some(product)) => {
                stats.products_enriched += 1;
                found.insert(product_id, product);
            }
            Ok(None) => {
                stats.lookup_failures += 1;
                debug!(%product_id, "product not in catalog");
            }
            Err(e) => {
                stats.lookup_failures += 1;
                warn!(%product_id, error = %e, "catalog lookup failed");
            }
        }
    }

    let mut enriched = Vec::with_capacity(records.len());
    for record in records {
        let product = found.get(&record.product_id).cloned();
        if product.is_some() {
            stats.records_enriched += 1;
        }
        enriched.push(EnrichedRecord { record, product });
    }

    (enriched, stats)
}

/// Unique product ids in deterministic (sorted) order.
fn unique_product_ids(records: &[CleanRecord]) -> Vec<String> {
    let mut ids: Vec<String> = records
        .iter()
        .map(|r| r.product_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticProductCatalog;
    use crate::error::{CatalogError, CatalogResult};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    fn record(transaction_id: &str, product_id: &str) -> CleanRecord {
        CleanRecord {
            transaction_id: transaction_id.into(),
            date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            product_id: product_id.into(),
            product_name: String::new(),
            quantity: 1,
            unit_price: Decimal::new(1000, 2),
            customer_id: "C001".into(),
            region: "North".into(),
        }
    }

    fn product(product_id: &str, name: &str, category: &str) -> ProductInfo {
        ProductInfo {
            product_id: product_id.into(),
            name: name.into(),
            category: category.into(),
        }
    }

    /// Records every id it is asked about.
    struct CountingCatalog {
        inner: StaticProductCatalog,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProductCatalog for CountingCatalog {
        async fn lookup(&self, product_id: &str) -> CatalogResult<Option<ProductInfo>> {
            self.calls.lock().unwrap().push(product_id.to_string());
            self.inner.lookup(product_id).await
        }
    }

    /// Fails for one specific id, answers normally otherwise.
    struct FlakyCatalog {
        inner: StaticProductCatalog,
        poison: String,
    }

    #[async_trait]
    impl ProductCatalog for FlakyCatalog {
        async fn lookup(&self, product_id: &str) -> CatalogResult<Option<ProductInfo>> {
            if product_id == self.poison {
                return Err(CatalogError::HttpError("connection reset".into()));
            }
            self.inner.lookup(product_id).await
        }
    }

    #[tokio::test]
    async fn test_enrichment_attaches_metadata_in_input_order() {
        let catalog = StaticProductCatalog::with_products([
            product("P101", "Wireless Mouse Pro", "electronics"),
            product("P102", "Standing Desk", "furniture"),
        ]);
        let records = vec![
            record("T1", "P101"),
            record("T2", "P999"),
            record("T3", "P102"),
            record("T4", "P101"),
        ];

        let (enriched, stats) = enrich_records(records, &catalog).await;

        let ids: Vec<&str> = enriched
            .iter()
            .map(|e| e.record.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T1", "T2", "T3", "T4"]);

        assert_eq!(enriched[0].category(), "electronics");
        assert_eq!(enriched[1].category(), "P999");
        assert_eq!(enriched[2].category(), "furniture");
        assert_eq!(enriched[3].category(), "electronics");

        assert_eq!(stats.products_looked_up, 3);
        assert_eq!(stats.products_enriched, 2);
        assert_eq!(stats.lookup_failures, 1);
        assert_eq!(stats.records_enriched, 3);
    }

    #[tokio::test]
    async fn test_each_unique_product_looked_up_once() {
        let catalog = CountingCatalog {
            inner: StaticProductCatalog::with_products([product("P101", "Mouse", "electronics")]),
            calls: Mutex::new(Vec::new()),
        };
        let records = vec![
            record("T1", "P101"),
            record("T2", "P101"),
            record("T3", "P102"),
            record("T4", "P101"),
            record("T5", "P102"),
        ];

        let (_, stats) = enrich_records(records, &catalog).await;

        let mut calls = catalog.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["P101", "P102"]);
        assert_eq!(stats.products_looked_up, 2);
    }

    #[tokio::test]
    async fn test_one_failing_lookup_does_not_poison_the_rest() {
        let catalog = FlakyCatalog {
            inner: StaticProductCatalog::with_products([product("P101", "Mouse", "electronics")]),
            poison: "P666".into(),
        };
        let records = vec![record("T1", "P666"), record("T2", "P101")];

        let (enriched, stats) = enrich_records(records, &catalog).await;

        assert_eq!(enriched.len(), 2);
        assert!(!enriched[0].is_enriched());
        assert_eq!(enriched[0].category(), "P666");
        assert!(enriched[1].is_enriched());

        assert_eq!(stats.products_looked_up, 2);
        assert_eq!(stats.products_enriched, 1);
        assert_eq!(stats.lookup_failures, 1);
        assert_eq!(stats.records_enriched, 1);
    }

    #[tokio::test]
    async fn test_no_records_no_lookups() {
        let catalog = StaticProductCatalog::new();
        let (enriched, stats) = enrich_records(Vec::new(), &catalog).await;
        assert!(enriched.is_empty());
        assert_eq!(stats, EnrichmentStats::default());
    }
}
