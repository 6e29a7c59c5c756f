//! Segmentation integration tests.
//!
//! Tests threshold boundaries end to end and the report's segment sections.

use super::{memory_dashboard, order, record_set, repeat_orders};
use pretty_assertions::assert_eq;
use retail_insights::analytics::SegmentSummary;
use retail_insights::segment::{Segment, SegmentThresholds};

#[tokio::test]
async fn test_boundaries_through_store() {
    let dashboard = memory_dashboard().await;
    let mut records = Vec::new();
    // 11 orders, 3000.01 total: Gold.
    records.extend(repeat_orders("G", "GOLD", 10, 300.0));
    records.push(order("G-x", "GOLD", "North", "Technology", 0.01, 0.0));
    // 11 orders, exactly 3000: Silver.
    records.extend(repeat_orders("S", "EDGE", 10, 300.0));
    records.push(order("S-x", "EDGE", "North", "Technology", 0.0, 0.0));
    // 10 orders, 5000: frequency not above 10, Silver.
    records.extend(repeat_orders("F", "FREQ", 10, 500.0));
    // 1 order, exactly 1000: Bronze.
    records.push(order("B-1", "LOW", "South", "Furniture", 1000.0, 0.0));
    // 1 order, 1000.01: Silver.
    records.push(order("B-2", "JUST", "South", "Furniture", 1000.01, 0.0));
    dashboard.ingest(&record_set(records)).await.unwrap();

    let segments: Vec<(String, Segment)> = dashboard
        .segment_customers()
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.aggregate.customer_id, c.segment))
        .collect();
    assert_eq!(
        segments,
        vec![
            ("EDGE".to_string(), Segment::Silver),
            ("FREQ".to_string(), Segment::Silver),
            ("GOLD".to_string(), Segment::Gold),
            ("JUST".to_string(), Segment::Silver),
            ("LOW".to_string(), Segment::Bronze),
        ]
    );
}

#[tokio::test]
async fn test_multi_line_order_counts_once() {
    let dashboard = memory_dashboard().await;
    let mut records = Vec::new();
    // 11 distinct orders, one of them split across two lines.
    records.extend(repeat_orders("M", "MULTI", 11, 300.0));
    records.push(order("M-0", "MULTI", "East", "Furniture", 100.0, 5.0));
    dashboard.ingest(&record_set(records)).await.unwrap();

    let customers = dashboard.segment_customers().await.unwrap();
    assert_eq!(customers[0].aggregate.frequency, 11);
    assert_eq!(customers[0].aggregate.monetary, 3400.0);
    assert_eq!(customers[0].segment, Segment::Gold);
}

#[tokio::test]
async fn test_thresholds_change_labels() {
    let mut dashboard = memory_dashboard().await;
    dashboard
        .ingest(&record_set(repeat_orders("T", "TUNE", 3, 600.0)))
        .await
        .unwrap();

    let before = dashboard.segment_customers().await.unwrap();
    assert_eq!(before[0].segment, Segment::Silver);

    dashboard.set_thresholds(SegmentThresholds::new(1500.0, 2, 500.0));
    let after = dashboard.segment_customers().await.unwrap();
    assert_eq!(after[0].segment, Segment::Gold);
}

#[tokio::test]
async fn test_report_counts_and_top_gold() {
    let dashboard = memory_dashboard().await;
    let mut records = Vec::new();
    for (i, sales) in [400.0, 500.0, 350.0, 600.0, 450.0, 700.0].iter().enumerate() {
        records.extend(repeat_orders(&format!("G{i}"), &format!("GOLD-{i}"), 12, *sales));
    }
    records.extend(repeat_orders("S", "SILVER", 2, 800.0));
    records.push(order("B", "BRONZE", "West", "Furniture", 99.0, -3.0));
    dashboard.ingest(&record_set(records)).await.unwrap();

    let report = dashboard.report(5).await.unwrap().unwrap();
    assert_eq!(
        report.segments,
        SegmentSummary {
            gold: 6,
            silver: 1,
            bronze: 1,
        }
    );
    let top: Vec<_> = report
        .top_gold
        .iter()
        .map(|c| c.aggregate.customer_id.as_str())
        .collect();
    assert_eq!(top, vec!["GOLD-5", "GOLD-3", "GOLD-1", "GOLD-4", "GOLD-0"]);
    assert!(report.top_gold.iter().all(|c| c.segment == Segment::Gold));

    let top_bronze = dashboard.top_customers(Segment::Bronze, 5).await.unwrap();
    assert_eq!(top_bronze.len(), 1);
    assert_eq!(top_bronze[0].aggregate.customer_id, "BRONZE");
}
