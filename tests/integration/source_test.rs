//! Data source integration tests.
//!
//! Tests CSV loading from disk and synthetic generation.

use super::memory_dashboard;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use retail_insights::error::InsightsError;
use retail_insights::source::{
    self, generate_with, CsvOptions, GeneratorConfig, CATEGORIES, REGIONS,
};
use std::io::Write;

const HEADER: &[u8] = b"Order ID,Order Date,Customer ID,Region,Category,Sales,Profit,City\n";

fn write_bytes(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_load_windows_1252_file() {
    let mut bytes = HEADER.to_vec();
    // 0xE9 is 'é' in windows-1252 and invalid as a lone UTF-8 byte.
    bytes.extend_from_slice(b"CA-1,11/8/2016,CG-12520,South,Furniture,261.96,41.91,Montr\xE9al\n");
    bytes.extend_from_slice(b"CA-2,2016-11-09,CG-12520,West,Technology,\"1,200.00\",-15.5,Qu\xE9bec\n");
    let file = write_bytes(&bytes);

    let dashboard = memory_dashboard().await;
    let rows = dashboard
        .load_csv(file.path(), &CsvOptions::default())
        .await
        .unwrap();
    assert_eq!(rows, 2);

    let result = dashboard
        .query("SELECT City FROM orders ORDER BY Order_ID")
        .await
        .unwrap();
    assert_eq!(
        result.get(0, "City").and_then(|v| v.as_str()),
        Some("Montréal")
    );

    let totals = dashboard.grand_totals().await.unwrap().unwrap();
    assert!((totals.total_sales - 1461.96).abs() < 1e-9);

    let customers = dashboard.customer_aggregates().await.unwrap();
    assert_eq!(
        customers[0].last_order_date,
        NaiveDate::from_ymd_opt(2016, 11, 9)
    );
}

#[tokio::test]
async fn test_strict_utf8_rejects_invalid_bytes() {
    let mut bytes = HEADER.to_vec();
    bytes.extend_from_slice(b"CA-1,2016-11-08,C1,South,Furniture,10,1,Montr\xE9al\n");
    let file = write_bytes(&bytes);

    let err = source::load_csv(file.path(), &CsvOptions::with_encoding("utf-8")).unwrap_err();
    assert!(matches!(err, InsightsError::DataSource { .. }));
}

#[tokio::test]
async fn test_missing_file_leaves_store_untouched() {
    let dashboard = memory_dashboard().await;
    dashboard
        .load_synthetic(&GeneratorConfig::default(), Some(3))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let err = dashboard
        .load_csv(&missing, &CsvOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("nope.csv"));

    let totals = dashboard.grand_totals().await.unwrap().unwrap();
    assert_eq!(totals.order_count, 1500);
}

#[tokio::test]
async fn test_unparseable_row_rejects_whole_file() {
    let mut bytes = HEADER.to_vec();
    bytes.extend_from_slice(b"CA-1,2016-11-08,C1,South,Furniture,10,1,X\n");
    bytes.extend_from_slice(b"CA-2,2016-11-08,C1,South,Furniture,ten,1,X\n");
    let file = write_bytes(&bytes);

    let dashboard = memory_dashboard().await;
    let err = dashboard
        .load_csv(file.path(), &CsvOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, InsightsError::DataSource { .. }));
    assert_eq!(dashboard.grand_totals().await.unwrap(), None);
}

#[tokio::test]
async fn test_generated_csv_round_trips_through_store() {
    let config = GeneratorConfig {
        rows: 120,
        ..GeneratorConfig::default()
    };
    let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let generated = generate_with(&config, today, &mut StdRng::seed_from_u64(99));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    source::write_csv(&path, &generated).unwrap();

    let dashboard = memory_dashboard().await;
    let rows = dashboard
        .load_csv(&path, &CsvOptions::with_encoding("utf-8"))
        .await
        .unwrap();
    assert_eq!(rows, 120);

    let totals = dashboard.grand_totals().await.unwrap().unwrap();
    assert!((totals.total_sales - generated.total_sales()).abs() < 1e-6);
    assert!((totals.total_profit - generated.total_profit()).abs() < 1e-6);
}

#[test]
fn test_generator_properties() {
    let config = GeneratorConfig::default();
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let earliest = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
    let set = generate_with(&config, today, &mut StdRng::seed_from_u64(2024));

    assert_eq!(set.len(), 1500);
    for record in &set.records {
        assert!(REGIONS.contains(&record.region.as_str()));
        assert!(CATEGORIES.contains(&record.category.as_str()));
        assert!((20.0..=1500.0).contains(&record.sales), "{}", record.sales);
        assert!(record.order_date <= today && record.order_date >= earliest);

        let margin = record.profit / record.sales;
        let (lo, hi) = config.margin_for(&record.category).bounds();
        // Rounding to cents can nudge the ratio just past the bound.
        assert!(margin >= lo - 0.01 && margin <= hi + 0.01, "{margin}");
        if record.category != "Furniture" {
            assert!(record.profit >= 0.0);
        }
    }

    let customers: std::collections::HashSet<_> =
        set.records.iter().map(|r| r.customer_id.as_str()).collect();
    assert!(customers.len() <= 100);
    assert!(customers.len() < set.len());
}
