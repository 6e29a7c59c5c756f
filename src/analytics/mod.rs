//! Aggregation and segmentation engine.
//!
//! `Dashboard` owns an injected [`OrderStore`] handle, replaces its contents
//! on every load, and answers the fixed KPI, regional, category and customer
//! queries. Customer aggregates are classified with the configured
//! [`SegmentThresholds`].

mod queries;

use crate::config::Config;
use crate::error::{InsightsError, Result};
use crate::safety::SqlGuard;
use crate::segment::{Segment, SegmentThresholds};
use crate::source::{self, CsvOptions, GeneratorConfig, RecordSet};
use crate::store::{self, OrderStore, QueryResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Grand totals across all orders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_sales: f64,
    pub total_profit: f64,
    pub order_count: u64,
}

impl Totals {
    /// Profit as a percentage of sales, or `None` when sales total zero.
    pub fn profit_margin_pct(&self) -> Option<f64> {
        if self.total_sales == 0.0 {
            None
        } else {
            Some(self.total_profit / self.total_sales * 100.0)
        }
    }
}

/// Sales and profit for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPerformance {
    pub region: String,
    pub sales: f64,
    pub profit: f64,
}

/// Sales and profit for one product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub sales: f64,
    pub profit: f64,
}

/// Per-customer RFM inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_id: String,
    /// Number of distinct orders.
    pub frequency: u64,
    /// Total sales.
    pub monetary: f64,
    /// Most recent order date.
    pub last_order_date: Option<NaiveDate>,
}

/// A customer aggregate with its assigned segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedCustomer {
    #[serde(flatten)]
    pub aggregate: CustomerAggregate,
    pub segment: Segment,
}

/// Number of customers in each segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub gold: usize,
    pub silver: usize,
    pub bronze: usize,
}

impl SegmentSummary {
    /// Counts the segments of the given customers.
    pub fn from_customers(customers: &[SegmentedCustomer]) -> Self {
        customers
            .iter()
            .fold(Self::default(), |mut summary, customer| {
                match customer.segment {
                    Segment::Gold => summary.gold += 1,
                    Segment::Silver => summary.silver += 1,
                    Segment::Bronze => summary.bronze += 1,
                }
                summary
            })
    }

    pub fn count(&self, segment: Segment) -> usize {
        match segment {
            Segment::Gold => self.gold,
            Segment::Silver => self.silver,
            Segment::Bronze => self.bronze,
        }
    }

    pub fn total(&self) -> usize {
        self.gold + self.silver + self.bronze
    }

    /// Fraction of customers in `segment`, or `None` with no customers.
    pub fn share(&self, segment: Segment) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.count(segment) as f64 / total as f64),
        }
    }
}

/// Everything the presentation layer renders after a successful load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub totals: Totals,
    pub regions: Vec<RegionPerformance>,
    pub categories: Vec<CategoryPerformance>,
    pub segments: SegmentSummary,
    pub top_gold: Vec<SegmentedCustomer>,
}

/// The aggregation and segmentation engine.
pub struct Dashboard {
    store: Arc<dyn OrderStore>,
    thresholds: SegmentThresholds,
    guard: SqlGuard,
}

impl Dashboard {
    /// Creates a dashboard over an existing store handle.
    pub fn new(store: Arc<dyn OrderStore>, thresholds: SegmentThresholds) -> Self {
        Self {
            store,
            thresholds,
            guard: SqlGuard::new(),
        }
    }

    /// Opens the configured store and creates a dashboard over it.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = store::open(&config.store_location()).await?;
        Ok(Self::new(store, config.segmentation))
    }

    /// Returns the active segmentation thresholds.
    pub fn thresholds(&self) -> &SegmentThresholds {
        &self.thresholds
    }

    /// Replaces the segmentation thresholds.
    pub fn set_thresholds(&mut self, thresholds: SegmentThresholds) {
        self.thresholds = thresholds;
    }

    /// Replaces the orders table with `records`.
    pub async fn ingest(&self, records: &RecordSet) -> Result<usize> {
        self.store.replace_orders(records).await
    }

    /// Loads a delimited file and ingests it. Nothing is ingested if the
    /// file fails to load.
    pub async fn load_csv(&self, path: &Path, options: &CsvOptions) -> Result<usize> {
        let records = source::load_csv(path, options)?;
        self.ingest(&records).await
    }

    /// Generates synthetic orders and ingests them.
    pub async fn load_synthetic(
        &self,
        config: &GeneratorConfig,
        seed: Option<u64>,
    ) -> Result<RecordSet> {
        let records = source::generate(config, seed)?;
        self.ingest(&records).await?;
        Ok(records)
    }

    /// Runs an ad hoc read-only query.
    pub async fn query(&self, sql: &str) -> Result<QueryResult> {
        let statement_type = self.guard.check(sql)?;
        debug!("Running ad hoc {statement_type} query");
        self.store.execute_query(sql).await
    }

    /// Sum of sales and profit; `None` when no orders are loaded.
    pub async fn grand_totals(&self) -> Result<Option<Totals>> {
        let result = self.store.execute_query(queries::TOTALS_SQL).await?;
        queries::map_totals(&result)
    }

    /// Per-region totals, most profitable first.
    pub async fn sales_by_region(&self) -> Result<Vec<RegionPerformance>> {
        let result = self.store.execute_query(queries::REGION_SQL).await?;
        queries::map_regions(&result)
    }

    /// Per-category totals, highest sales first.
    pub async fn sales_by_category(&self) -> Result<Vec<CategoryPerformance>> {
        let result = self.store.execute_query(queries::CATEGORY_SQL).await?;
        queries::map_categories(&result)
    }

    /// Per-customer frequency, monetary value and last order date.
    pub async fn customer_aggregates(&self) -> Result<Vec<CustomerAggregate>> {
        let result = self.store.execute_query(queries::CUSTOMER_SQL).await?;
        queries::map_customers(&result)
    }

    /// Classifies every customer with the current thresholds.
    pub async fn segment_customers(&self) -> Result<Vec<SegmentedCustomer>> {
        Ok(self.classify(self.customer_aggregates().await?))
    }

    fn classify(&self, aggregates: Vec<CustomerAggregate>) -> Vec<SegmentedCustomer> {
        aggregates
            .into_iter()
            .map(|aggregate| SegmentedCustomer {
                segment: self
                    .thresholds
                    .classify(aggregate.frequency, aggregate.monetary),
                aggregate,
            })
            .collect()
    }

    /// The `limit` customers of `segment` with the highest monetary value.
    pub async fn top_customers(
        &self,
        segment: Segment,
        limit: usize,
    ) -> Result<Vec<SegmentedCustomer>> {
        let customers = self.segment_customers().await?;
        Ok(top_of_segment(customers, segment, limit))
    }

    /// Builds the full report, or `None` when no orders are loaded.
    ///
    /// The totals query gates everything else: if it fails or finds no data,
    /// no dependent section is computed. All sections are then read from one
    /// snapshot of the table, so they agree even while loads run alongside.
    pub async fn report(&self, top_n: usize) -> Result<Option<DashboardReport>> {
        if self.grand_totals().await?.is_none() {
            info!("No orders loaded; skipping report");
            return Ok(None);
        }

        let results = self
            .store
            .execute_batch(&[
                queries::TOTALS_SQL,
                queries::REGION_SQL,
                queries::CATEGORY_SQL,
                queries::CUSTOMER_SQL,
            ])
            .await?;
        let [totals, regions, categories, customers] = results.as_slice() else {
            return Err(InsightsError::internal(format!(
                "Expected 4 report sections, store returned {}",
                results.len()
            )));
        };

        // The table may have been emptied since the gate ran.
        let Some(totals) = queries::map_totals(totals)? else {
            info!("Orders were cleared before the report was read");
            return Ok(None);
        };
        let regions = queries::map_regions(regions)?;
        let categories = queries::map_categories(categories)?;
        let customers = self.classify(queries::map_customers(customers)?);

        let segments = SegmentSummary::from_customers(&customers);
        let top_gold = top_of_segment(customers, Segment::Gold, top_n);

        Ok(Some(DashboardReport {
            totals,
            regions,
            categories,
            segments,
            top_gold,
        }))
    }

    /// Closes the underlying store.
    pub async fn close(&self) -> Result<()> {
        self.store.close().await
    }
}

fn top_of_segment(
    customers: Vec<SegmentedCustomer>,
    segment: Segment,
    limit: usize,
) -> Vec<SegmentedCustomer> {
    let mut selected: Vec<_> = customers
        .into_iter()
        .filter(|c| c.segment == segment)
        .collect();
    selected.sort_by(|a, b| {
        b.aggregate
            .monetary
            .total_cmp(&a.aggregate.monetary)
            .then_with(|| a.aggregate.customer_id.cmp(&b.aggregate.customer_id))
    });
    selected.truncate(limit);
    selected
}
