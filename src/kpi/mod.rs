//! KPI aggregation over enriched records.
//!
//! All aggregation happens in a single pass over the records, into
//! plain accumulator maps. Monetary sums stay exact [`Decimal`]s
//! throughout the pass; rounding to two decimal places happens once,
//! while building the output structures.
//!
//! Every ranking has a total order (ties broken by id or name), so the
//! same records always produce byte-identical KPI output.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::EnrichedRecord;

// =============================================================================
// Limits
// =============================================================================

/// How many products the quantity ranking keeps.
pub const TOP_PRODUCTS_LIMIT: usize = 5;

/// How many customers the spend ranking keeps.
pub const TOP_CUSTOMERS_LIMIT: usize = 5;

/// Products that sold fewer units than this are flagged as low performers.
pub const LOW_QUANTITY_THRESHOLD: i64 = 10;

// =============================================================================
// Output Structures
// =============================================================================

/// One region's slice of total revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRevenue {
    pub region: String,
    pub total_sales: Decimal,
    pub transaction_count: usize,
    /// Share of total revenue, in percent.
    pub percentage: Decimal,
}

/// Aggregated sales of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product_id: String,
    /// Best known name: catalog first, then the input file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

/// Aggregated spend of one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSpend {
    pub customer_id: String,
    pub total_spent: Decimal,
    pub order_count: usize,
    pub avg_order_value: Decimal,
    /// Unique products bought, by best known name (raw product id when
    /// no name exists), sorted.
    pub products_bought: Vec<String>,
}

/// One day of the sales trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

/// The single best day of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakSalesDay {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub transaction_count: usize,
}

/// Revenue per category, in first-appearance order.
///
/// Serialized as a JSON object whose keys keep the order in which the
/// categories first showed up in the input. Categories are few, so the
/// linear scan on insert is fine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryRevenue {
    entries: Vec<(String, Decimal)>,
}

impl CategoryRevenue {
    fn add(&mut self, category: &str, amount: Decimal) {
        if let Some((_, total)) = self.entries.iter_mut().find(|(c, _)| c == category) {
            *total += amount;
        } else {
            self.entries.push((category.to_string(), amount));
        }
    }

    fn rounded(mut self) -> Self {
        for (_, amount) in &mut self.entries {
            *amount = amount.round_dp(2);
        }
        self
    }

    /// Revenue for one category, if it appeared at all.
    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, amount)| *amount)
    }

    /// Categories and amounts, in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(c, amount)| (c.as_str(), *amount))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CategoryRevenue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, amount) in &self.entries {
            map.serialize_entry(category, amount)?;
        }
        map.end()
    }
}

/// The full KPI block of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_orders: usize,
    pub total_revenue: Decimal,
    pub avg_order_value: Decimal,
    pub revenue_by_category: CategoryRevenue,
    pub revenue_by_region: Vec<RegionRevenue>,
    pub top_products_by_quantity: Vec<ProductSales>,
    pub low_performing_products: Vec<ProductSales>,
    pub top_customers_by_spend: Vec<CustomerSpend>,
    pub repeat_customers: usize,
    pub daily_revenue: Vec<DailyRevenue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_sales_day: Option<PeakSalesDay>,
}

// =============================================================================
// Accumulators
// =============================================================================

#[derive(Default)]
struct ProductAcc {
    name: Option<String>,
    quantity: i64,
    revenue: Decimal,
}

#[derive(Default)]
struct RegionAcc {
    revenue: Decimal,
    count: usize,
}

#[derive(Default)]
struct CustomerAcc {
    spent: Decimal,
    orders: usize,
    products: BTreeSet<String>,
}

#[derive(Default)]
struct DayAcc {
    revenue: Decimal,
    count: usize,
    customers: HashSet<String>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Compute every KPI in one pass over the records.
pub fn compute_kpis(records: &[EnrichedRecord]) -> Kpis {
    let mut total_revenue = Decimal::ZERO;
    let mut categories = CategoryRevenue::default();
    let mut products: HashMap<String, ProductAcc> = HashMap::new();
    let mut regions: HashMap<String, RegionAcc> = HashMap::new();
    let mut customers: HashMap<String, CustomerAcc> = HashMap::new();
    let mut days: BTreeMap<NaiveDate, DayAcc> = BTreeMap::new();

    for enriched in records {
        let record = &enriched.record;
        let revenue = record.revenue();

        total_revenue += revenue;
        categories.add(enriched.category(), revenue);

        let product = products.entry(record.product_id.clone()).or_default();
        product.quantity += record.quantity;
        product.revenue += revenue;
        if product.name.is_none() {
            product.name = enriched.product_label().map(str::to_string);
        }

        let region = regions.entry(record.region.clone()).or_default();
        region.revenue += revenue;
        region.count += 1;

        let customer = customers.entry(record.customer_id.clone()).or_default();
        customer.spent += revenue;
        customer.orders += 1;
        customer.products.insert(
            enriched
                .product_label()
                .unwrap_or(record.product_id.as_str())
                .to_string(),
        );

        let day = days.entry(record.date).or_default();
        day.revenue += revenue;
        day.count += 1;
        day.customers.insert(record.customer_id.clone());
    }

    let total_orders = records.len();
    let avg_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        total_revenue / Decimal::from(total_orders)
    };

    // Regions: revenue descending, name ascending on ties
    let mut revenue_by_region: Vec<RegionRevenue> = regions
        .into_iter()
        .map(|(region, acc)| {
            let percentage = if total_revenue.is_zero() {
                Decimal::ZERO
            } else {
                (acc.revenue / total_revenue * Decimal::ONE_HUNDRED).round_dp(2)
            };
            RegionRevenue {
                region,
                total_sales: acc.revenue.round_dp(2),
                transaction_count: acc.count,
                percentage,
            }
        })
        .collect();
    revenue_by_region.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then_with(|| a.region.cmp(&b.region))
    });

    // Products: quantity descending, id ascending on ties
    let mut ranked_products: Vec<(String, ProductAcc)> = products.into_iter().collect();
    ranked_products.sort_by(|a, b| {
        b.1.quantity
            .cmp(&a.1.quantity)
            .then_with(|| a.0.cmp(&b.0))
    });

    let top_products_by_quantity: Vec<ProductSales> = ranked_products
        .iter()
        .take(TOP_PRODUCTS_LIMIT)
        .map(|(id, acc)| product_sales(id, acc))
        .collect();

    let mut low: Vec<&(String, ProductAcc)> = ranked_products
        .iter()
        .filter(|(_, acc)| acc.quantity < LOW_QUANTITY_THRESHOLD)
        .collect();
    low.sort_by(|a, b| a.1.quantity.cmp(&b.1.quantity).then_with(|| a.0.cmp(&b.0)));
    let low_performing_products: Vec<ProductSales> =
        low.into_iter().map(|(id, acc)| product_sales(id, acc)).collect();

    // Customers: spend descending, id ascending on ties
    let repeat_customers = customers.values().filter(|acc| acc.orders >= 2).count();
    let mut ranked_customers: Vec<(String, CustomerAcc)> = customers.into_iter().collect();
    ranked_customers.sort_by(|a, b| b.1.spent.cmp(&a.1.spent).then_with(|| a.0.cmp(&b.0)));
    let top_customers_by_spend: Vec<CustomerSpend> = ranked_customers
        .iter()
        .take(TOP_CUSTOMERS_LIMIT)
        .map(|(id, acc)| CustomerSpend {
            customer_id: id.clone(),
            total_spent: acc.spent.round_dp(2),
            order_count: acc.orders,
            avg_order_value: (acc.spent / Decimal::from(acc.orders)).round_dp(2),
            products_bought: acc.products.iter().cloned().collect(),
        })
        .collect();

    // Peak day: strictly greater wins, so the earliest day keeps ties
    let mut peak: Option<(NaiveDate, &DayAcc)> = None;
    for (date, acc) in &days {
        let better = match &peak {
            None => true,
            Some((_, best)) => acc.revenue > best.revenue,
        };
        if better {
            peak = Some((*date, acc));
        }
    }
    let peak_sales_day = peak.map(|(date, acc)| PeakSalesDay {
        date,
        revenue: acc.revenue.round_dp(2),
        transaction_count: acc.count,
    });

    let daily_revenue: Vec<DailyRevenue> = days
        .into_iter()
        .map(|(date, acc)| DailyRevenue {
            date,
            revenue: acc.revenue.round_dp(2),
            transaction_count: acc.count,
            unique_customers: acc.customers.len(),
        })
        .collect();

    Kpis {
        total_orders,
        total_revenue: total_revenue.round_dp(2),
        avg_order_value: avg_order_value.round_dp(2),
        revenue_by_category: categories.rounded(),
        revenue_by_region,
        top_products_by_quantity,
        low_performing_products,
        top_customers_by_spend,
        repeat_customers,
        daily_revenue,
        peak_sales_day,
    }
}

fn product_sales(product_id: &str, acc: &ProductAcc) -> ProductSales {
    ProductSales {
        product_id: product_id.to_string(),
        product_name: acc.name.clone(),
        quantity_sold: acc.quantity,
        revenue: acc.revenue.round_dp(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CleanRecord, ProductInfo};

    fn sale(
        transaction_id: &str,
        day: u32,
        product_id: &str,
        quantity: i64,
        price_cents: i64,
        customer_id: &str,
        region: &str,
    ) -> EnrichedRecord {
        EnrichedRecord {
            record: CleanRecord {
                transaction_id: transaction_id.into(),
                date: NaiveDate::from_ymd_opt(2024, 12, day).unwrap(),
                product_id: product_id.into(),
                product_name: String::new(),
                quantity,
                unit_price: Decimal::new(price_cents, 2),
                customer_id: customer_id.into(),
                region: region.into(),
            },
            product: None,
        }
    }

    fn with_category(mut enriched: EnrichedRecord, name: &str, category: &str) -> EnrichedRecord {
        enriched.product = Some(ProductInfo {
            product_id: enriched.record.product_id.clone(),
            name: name.into(),
            category: category.into(),
        });
        enriched
    }

    #[test]
    fn test_totals_and_average() {
        let records = vec![
            sale("T1", 1, "P1", 2, 1999, "C1", "North"),
            sale("T2", 1, "P2", 1, 500, "C2", "North"),
            sale("T3", 2, "P1", 3, 1000, "C1", "South"),
        ];
        let kpis = compute_kpis(&records);

        assert_eq!(kpis.total_orders, 3);
        // 39.98 + 5.00 + 30.00
        assert_eq!(kpis.total_revenue, Decimal::new(7498, 2));
        // 74.98 / 3 = 24.9933..
        assert_eq!(kpis.avg_order_value, Decimal::new(2499, 2));
    }

    #[test]
    fn test_category_order_is_first_appearance() {
        let records = vec![
            with_category(sale("T1", 1, "P1", 1, 100, "C1", "N"), "A", "beauty"),
            with_category(sale("T2", 1, "P2", 1, 200, "C1", "N"), "B", "appliances"),
            with_category(sale("T3", 1, "P1", 1, 300, "C1", "N"), "A", "beauty"),
            with_category(sale("T4", 1, "P3", 1, 400, "C1", "N"), "C", "groceries"),
        ];
        let kpis = compute_kpis(&records);

        let order: Vec<&str> = kpis.revenue_by_category.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["beauty", "appliances", "groceries"]);
        assert_eq!(
            kpis.revenue_by_category.get("beauty"),
            Some(Decimal::new(400, 2))
        );

        // Serialized text keeps that order (alphabetical would flip it)
        let json = serde_json::to_string(&kpis.revenue_by_category).unwrap();
        let beauty = json.find("beauty").unwrap();
        let appliances = json.find("appliances").unwrap();
        let groceries = json.find("groceries").unwrap();
        assert!(beauty < appliances && appliances < groceries);
    }

    #[test]
    fn test_unmatched_products_keep_their_revenue_visible() {
        let records = vec![
            with_category(sale("T1", 1, "P1", 1, 1000, "C1", "N"), "Mouse", "electronics"),
            sale("T2", 1, "P999", 2, 500, "C1", "N"),
        ];
        let kpis = compute_kpis(&records);

        assert_eq!(
            kpis.revenue_by_category.get("electronics"),
            Some(Decimal::new(1000, 2))
        );
        // No catalog match: bucketed under the raw product id
        assert_eq!(
            kpis.revenue_by_category.get("P999"),
            Some(Decimal::new(1000, 2))
        );
    }

    #[test]
    fn test_region_ranking_and_percentage() {
        let records = vec![
            sale("T1", 1, "P1", 1, 2500, "C1", "South"),
            sale("T2", 1, "P1", 1, 2500, "C2", "North"),
            sale("T3", 2, "P1", 1, 5000, "C3", "North"),
        ];
        let kpis = compute_kpis(&records);

        assert_eq!(kpis.revenue_by_region.len(), 2);
        assert_eq!(kpis.revenue_by_region[0].region, "North");
        assert_eq!(kpis.revenue_by_region[0].total_sales, Decimal::new(7500, 2));
        assert_eq!(kpis.revenue_by_region[0].transaction_count, 2);
        assert_eq!(kpis.revenue_by_region[0].percentage, Decimal::new(7500, 2));
        assert_eq!(kpis.revenue_by_region[1].region, "South");
        assert_eq!(kpis.revenue_by_region[1].percentage, Decimal::new(2500, 2));
    }

    #[test]
    fn test_top_products_limit_and_tie_break() {
        let records = vec![
            sale("T1", 1, "P6", 1, 100, "C1", "N"),
            sale("T2", 1, "P5", 2, 100, "C1", "N"),
            sale("T3", 1, "P4", 3, 100, "C1", "N"),
            sale("T4", 1, "P3", 4, 100, "C1", "N"),
            // P1 and P2 tie on quantity; lower id ranks first
            sale("T5", 1, "P2", 9, 100, "C1", "N"),
            sale("T6", 1, "P1", 9, 100, "C1", "N"),
        ];
        let kpis = compute_kpis(&records);

        let ids: Vec<&str> = kpis
            .top_products_by_quantity
            .iter()
            .map(|p| p.product_id.as_str())
            .collect();
        assert_eq!(ids, vec!["P1", "P2", "P3", "P4", "P5"]);
        assert_eq!(kpis.top_products_by_quantity.len(), TOP_PRODUCTS_LIMIT);
    }

    #[test]
    fn test_low_performing_products_ascending_below_threshold() {
        let records = vec![
            sale("T1", 1, "P1", 10, 100, "C1", "N"),
            sale("T2", 1, "P2", 9, 100, "C1", "N"),
            sale("T3", 1, "P3", 2, 100, "C1", "N"),
            sale("T4", 1, "P3", 1, 100, "C1", "N"),
        ];
        let kpis = compute_kpis(&records);

        let ids: Vec<&str> = kpis
            .low_performing_products
            .iter()
            .map(|p| p.product_id.as_str())
            .collect();
        // P1 sold exactly the threshold, so it is not low-performing
        assert_eq!(ids, vec!["P3", "P2"]);
        assert_eq!(kpis.low_performing_products[0].quantity_sold, 3);
    }

    #[test]
    fn test_customer_spend_and_repeat_customers() {
        let records = vec![
            sale("T1", 1, "P1", 1, 10000, "C1", "N"),
            with_category(sale("T2", 2, "P2", 1, 2000, "C1", "N"), "Desk Lamp", "lighting"),
            sale("T3", 2, "P1", 1, 5000, "C2", "N"),
        ];
        let kpis = compute_kpis(&records);

        assert_eq!(kpis.repeat_customers, 1);
        assert_eq!(kpis.top_customers_by_spend[0].customer_id, "C1");
        assert_eq!(
            kpis.top_customers_by_spend[0].total_spent,
            Decimal::new(12000, 2)
        );
        assert_eq!(kpis.top_customers_by_spend[0].order_count, 2);
        assert_eq!(
            kpis.top_customers_by_spend[0].avg_order_value,
            Decimal::new(6000, 2)
        );
        // Products listed by best known name, unnamed ones by raw id, sorted
        assert_eq!(
            kpis.top_customers_by_spend[0].products_bought,
            vec!["Desk Lamp", "P1"]
        );
        assert_eq!(kpis.top_customers_by_spend[1].customer_id, "C2");
        assert_eq!(kpis.top_customers_by_spend[1].products_bought, vec!["P1"]);
    }

    #[test]
    fn test_daily_trend_sorted_and_peak_prefers_earliest() {
        let records = vec![
            sale("T1", 3, "P1", 1, 1500, "C1", "N"),
            sale("T2", 1, "P1", 1, 1000, "C1", "N"),
            sale("T3", 1, "P1", 1, 500, "C2", "N"),
        ];
        let kpis = compute_kpis(&records);

        let dates: Vec<NaiveDate> = kpis.daily_revenue.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 3).unwrap(),
            ]
        );
        assert_eq!(kpis.daily_revenue[0].transaction_count, 2);
        assert_eq!(kpis.daily_revenue[0].unique_customers, 2);

        // Dec 1 and Dec 3 both made 15.00; the earlier day wins
        let peak = kpis.peak_sales_day.expect("peak exists");
        assert_eq!(peak.date, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(peak.revenue, Decimal::new(1500, 2));
        assert_eq!(peak.transaction_count, 2);
    }

    #[test]
    fn test_no_records_means_empty_kpis() {
        let kpis = compute_kpis(&[]);

        assert_eq!(kpis.total_orders, 0);
        assert_eq!(kpis.total_revenue, Decimal::ZERO);
        assert_eq!(kpis.avg_order_value, Decimal::ZERO);
        assert!(kpis.revenue_by_category.is_empty());
        assert!(kpis.revenue_by_region.is_empty());
        assert!(kpis.top_products_by_quantity.is_empty());
        assert!(kpis.daily_revenue.is_empty());
        assert!(kpis.peak_sales_day.is_none());

        let json = serde_json::to_string(&kpis).unwrap();
        assert!(!json.contains("peak_sales_day"));
    }
}
