//! Ingestion integration tests.
//!
//! Tests table replacement, rollback on failure and concurrent access.

use super::{memory_dashboard, order, record_set, repeat_orders};
use pretty_assertions::assert_eq;
use retail_insights::analytics::Dashboard;
use retail_insights::error::InsightsError;
use retail_insights::segment::SegmentThresholds;
use retail_insights::source::{GeneratorConfig, MarginRange, RecordSet};
use retail_insights::store::{self, FailingStore, StoreLocation};
use std::sync::Arc;

async fn order_count(dashboard: &Dashboard) -> i64 {
    let result = dashboard
        .query("SELECT COUNT(*) AS n FROM orders")
        .await
        .unwrap();
    result.get(0, "n").and_then(|v| v.as_i64()).unwrap()
}

#[tokio::test]
async fn test_round_trip_totals() {
    let dashboard = memory_dashboard().await;
    let set = record_set(vec![
        order("1", "A", "North", "Technology", 120.50, 30.25),
        order("2", "B", "South", "Furniture", 80.00, -12.00),
        order("3", "A", "East", "Office Supplies", 15.75, 4.00),
    ]);

    let rows = dashboard.ingest(&set).await.unwrap();
    assert_eq!(rows, 3);

    let totals = dashboard.grand_totals().await.unwrap().unwrap();
    assert!((totals.total_sales - set.total_sales()).abs() < 1e-9);
    assert!((totals.total_profit - set.total_profit()).abs() < 1e-9);
    assert_eq!(totals.order_count, 3);
}

#[tokio::test]
async fn test_replace_discards_previous_rows() {
    let dashboard = memory_dashboard().await;
    let first = record_set(repeat_orders("A", "OLD", 25, 10.0));
    let second = record_set(vec![
        order("B-1", "NEW", "West", "Technology", 100.0, 20.0),
        order("B-2", "NEW", "West", "Technology", 50.0, 5.0),
    ]);

    dashboard.ingest(&first).await.unwrap();
    dashboard.ingest(&second).await.unwrap();

    assert_eq!(order_count(&dashboard).await, 2);
    let customers = dashboard.customer_aggregates().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].customer_id, "NEW");
    let totals = dashboard.grand_totals().await.unwrap().unwrap();
    assert_eq!(totals.total_sales, 150.0);
}

#[tokio::test]
async fn test_empty_ingest_leaves_no_data() {
    let dashboard = memory_dashboard().await;
    dashboard
        .ingest(&record_set(repeat_orders("A", "X", 3, 10.0)))
        .await
        .unwrap();
    dashboard.ingest(&RecordSet::default()).await.unwrap();

    assert_eq!(dashboard.grand_totals().await.unwrap(), None);
    assert!(dashboard.report(5).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_ingest_keeps_previous_table() {
    let dashboard = memory_dashboard().await;
    dashboard
        .ingest(&record_set(repeat_orders("A", "KEEP", 4, 10.0)))
        .await
        .unwrap();

    // Extras without matching columns cannot be written.
    let mut bad = record_set(repeat_orders("B", "LOST", 2, 10.0));
    bad.records[1].extras.push("stray".to_string());
    let err = dashboard.ingest(&bad).await.unwrap_err();
    assert!(matches!(err, InsightsError::Ingestion(_)));

    assert_eq!(order_count(&dashboard).await, 4);
    let customers = dashboard.customer_aggregates().await.unwrap();
    assert_eq!(customers[0].customer_id, "KEEP");
}

#[tokio::test]
async fn test_extra_columns_are_queryable() {
    let dashboard = memory_dashboard().await;
    let mut set = record_set(vec![
        order("1", "A", "North", "Technology", 10.0, 1.0),
        order("2", "B", "North", "Technology", 20.0, 2.0),
    ]);
    set.extra_columns = vec!["Ship_Mode".to_string()];
    set.records[0].extras = vec!["First Class".to_string()];
    set.records[1].extras = vec!["Standard".to_string()];
    dashboard.ingest(&set).await.unwrap();

    let result = dashboard
        .query("SELECT Ship_Mode FROM orders ORDER BY Order_ID")
        .await
        .unwrap();
    assert_eq!(
        result.get(1, "Ship_Mode").and_then(|v| v.as_str()),
        Some("Standard")
    );
}

#[tokio::test]
async fn test_store_failure_is_distinct_from_no_data() {
    let dashboard = Dashboard::new(
        Arc::new(FailingStore::new("database is locked")),
        SegmentThresholds::default(),
    );
    let err = dashboard.grand_totals().await.unwrap_err();
    assert!(matches!(err, InsightsError::Query(_)));
    assert!(err.to_string().contains("database is locked"));
}

#[tokio::test]
async fn test_synthetic_load_replaces_table() {
    let dashboard = memory_dashboard().await;
    let config = GeneratorConfig {
        rows: 300,
        customer_pool: 25,
        ..GeneratorConfig::default()
    };

    let records = dashboard.load_synthetic(&config, Some(11)).await.unwrap();
    assert_eq!(records.len(), 300);
    assert_eq!(order_count(&dashboard).await, 300);

    let customers = dashboard.customer_aggregates().await.unwrap();
    assert!(customers.len() <= 25);
    let frequency: u64 = customers.iter().map(|c| c.frequency).sum();
    assert_eq!(frequency, 300);
}

#[tokio::test]
async fn test_invalid_generator_config_keeps_table() {
    let dashboard = memory_dashboard().await;
    dashboard
        .ingest(&record_set(repeat_orders("K", "KEPT", 4, 5.0)))
        .await
        .unwrap();

    let config = GeneratorConfig {
        loss_prone_margin: MarginRange::new(f64::NEG_INFINITY, f64::NAN),
        ..GeneratorConfig::default()
    };
    let err = dashboard.load_synthetic(&config, Some(1)).await.unwrap_err();
    assert!(matches!(err, InsightsError::Config(_)));
    assert_eq!(order_count(&dashboard).await, 4);
}

#[tokio::test]
async fn test_readers_never_see_partial_replace() {
    let dashboard = Arc::new(memory_dashboard().await);
    let small = record_set(repeat_orders("S", "SMALL", 10, 1.0));
    let large = record_set(repeat_orders("L", "LARGE", 500, 1.0));
    dashboard.ingest(&small).await.unwrap();

    let writer = {
        let dashboard = Arc::clone(&dashboard);
        tokio::spawn(async move {
            for _ in 0..5 {
                dashboard.ingest(&large).await.unwrap();
                dashboard.ingest(&small).await.unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let dashboard = Arc::clone(&dashboard);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..10 {
                    seen.push(order_count(&dashboard).await);
                }
                seen
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        for count in reader.await.unwrap() {
            assert!(count == 10 || count == 500, "observed partial table: {count}");
        }
    }
}

#[tokio::test]
async fn test_report_sections_agree_during_reloads() {
    let dashboard = Arc::new(memory_dashboard().await);
    let small = record_set(repeat_orders("S", "SMALL", 10, 1.0));
    let large = record_set(repeat_orders("L", "LARGE", 500, 2.0));
    dashboard.ingest(&small).await.unwrap();

    let writer = {
        let dashboard = Arc::clone(&dashboard);
        tokio::spawn(async move {
            for _ in 0..5 {
                dashboard.ingest(&large).await.unwrap();
                dashboard.ingest(&small).await.unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let dashboard = Arc::clone(&dashboard);
            tokio::spawn(async move {
                let mut reports = Vec::new();
                for _ in 0..10 {
                    reports.push(dashboard.report(5).await.unwrap().unwrap());
                }
                reports
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        for report in reader.await.unwrap() {
            let total = report.totals.total_sales;
            let by_region: f64 = report.regions.iter().map(|r| r.sales).sum();
            let by_category: f64 = report.categories.iter().map(|c| c.sales).sum();
            assert_eq!(by_region, total, "regions read from another load");
            assert_eq!(by_category, total, "categories read from another load");
            assert_eq!(report.segments.total(), 1);
        }
    }
}

#[tokio::test]
async fn test_file_store_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let location = StoreLocation::File(dir.path().join("nested").join("retail.db"));

    {
        let store = store::open(&location).await.unwrap();
        let dashboard = Dashboard::new(store, SegmentThresholds::default());
        dashboard
            .ingest(&record_set(repeat_orders("P", "KEPT", 7, 3.0)))
            .await
            .unwrap();
        dashboard.close().await.unwrap();
    }

    let store = store::open(&location).await.unwrap();
    let dashboard = Dashboard::new(store, SegmentThresholds::default());
    let totals = dashboard.grand_totals().await.unwrap().unwrap();
    assert_eq!(totals.order_count, 7);
    assert_eq!(totals.total_sales, 21.0);
}
