//! Integration tests for Retail Insights.

pub mod ingest_test;
pub mod segmentation_test;
pub mod source_test;

use chrono::NaiveDate;
use retail_insights::analytics::Dashboard;
use retail_insights::segment::SegmentThresholds;
use retail_insights::source::{OrderRecord, RecordSet};
use retail_insights::store::SqliteStore;
use std::sync::Arc;

/// Builds an order dated 2024-03-15 unless overridden by the caller.
pub fn order(
    order_id: &str,
    customer_id: &str,
    region: &str,
    category: &str,
    sales: f64,
    profit: f64,
) -> OrderRecord {
    OrderRecord {
        order_id: order_id.to_string(),
        order_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        customer_id: customer_id.to_string(),
        region: region.to_string(),
        category: category.to_string(),
        sales,
        profit,
        extras: Vec::new(),
    }
}

/// A dashboard over a fresh in-memory store with default thresholds.
pub async fn memory_dashboard() -> Dashboard {
    let store = SqliteStore::open_in_memory().await.unwrap();
    Dashboard::new(Arc::new(store), SegmentThresholds::default())
}

/// `n` single-line orders for one customer, each worth `sales`.
pub fn repeat_orders(prefix: &str, customer: &str, n: usize, sales: f64) -> Vec<OrderRecord> {
    (0..n)
        .map(|i| {
            order(
                &format!("{prefix}-{i}"),
                customer,
                "North",
                "Technology",
                sales,
                sales * 0.1,
            )
        })
        .collect()
}

pub fn record_set(records: Vec<OrderRecord>) -> RecordSet {
    RecordSet::new(records)
}
