//! Synthetic order generator.
//!
//! Produces a differentiated demo dataset: a small customer pool guarantees
//! repeat purchases, and Furniture carries a loss-prone margin range so the
//! regional and category breakdowns are not uniform.

use super::{OrderRecord, RecordSet, CATEGORIES, REGIONS};
use crate::error::{InsightsError, Result};
use chrono::{Days, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Category whose orders use [`GeneratorConfig::loss_prone_margin`].
const LOSS_PRONE_CATEGORY: &str = "Furniture";

/// Largest accepted date window (roughly a century).
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Largest accepted sales amount.
pub const MAX_SALES: f64 = 1e9;

/// Largest accepted margin magnitude, as a fraction of sales.
pub const MAX_MARGIN: f64 = 10.0;

/// Inclusive range of profit as a fraction of sales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginRange {
    pub min: f64,
    pub max: f64,
}

impl MarginRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns the bounds ordered low to high.
    pub fn bounds(&self) -> (f64, f64) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }

    /// Checks that both bounds are finite and within `MAX_MARGIN`.
    fn validate(&self, name: &str) -> Result<()> {
        for bound in [self.min, self.max] {
            if !bound.is_finite() || bound.abs() > MAX_MARGIN {
                return Err(InsightsError::config(format!(
                    "Generator {name} bounds must be finite and within \
                     -{MAX_MARGIN}..={MAX_MARGIN}, got {bound}"
                )));
            }
        }
        Ok(())
    }

    /// Returns true if `fraction` lies within the range.
    pub fn contains(&self, fraction: f64) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&fraction)
    }
}

/// Parameters for synthetic data generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of orders to generate.
    pub rows: usize,

    /// Number of distinct customers (`CUST-1` ..= `CUST-<n>`).
    pub customer_pool: u32,

    /// Lowest possible order sales amount.
    pub sales_min: f64,

    /// Highest possible order sales amount.
    pub sales_max: f64,

    /// Length of the trailing date window, in days, ending at generation time.
    pub window_days: u32,

    /// Margin range for Furniture orders.
    pub loss_prone_margin: MarginRange,

    /// Margin range for every other category.
    pub default_margin: MarginRange,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 1500,
            customer_pool: 100,
            sales_min: 20.0,
            sales_max: 1500.0,
            window_days: 365,
            loss_prone_margin: MarginRange::new(-0.1, 0.3),
            default_margin: MarginRange::new(0.1, 0.5),
        }
    }
}

impl GeneratorConfig {
    /// Returns the margin range applied to orders of `category`.
    pub fn margin_for(&self, category: &str) -> MarginRange {
        if category == LOSS_PRONE_CATEGORY {
            self.loss_prone_margin
        } else {
            self.default_margin
        }
    }

    /// Returns the sales bounds ordered low to high.
    pub fn sales_bounds(&self) -> (f64, f64) {
        MarginRange::new(self.sales_min, self.sales_max).bounds()
    }

    /// Rejects parameters the random source cannot sample from.
    pub fn validate(&self) -> Result<()> {
        for bound in [self.sales_min, self.sales_max] {
            if !(0.0..=MAX_SALES).contains(&bound) {
                return Err(InsightsError::config(format!(
                    "Generator sales bounds must be finite and within 0..={MAX_SALES}, got {bound}"
                )));
            }
        }
        self.loss_prone_margin.validate("loss_prone_margin")?;
        self.default_margin.validate("default_margin")?;

        if self.customer_pool == 0 {
            return Err(InsightsError::config("Generator customer_pool must be at least 1"));
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(InsightsError::config(format!(
                "Generator window_days must be at most {MAX_WINDOW_DAYS}, got {}",
                self.window_days
            )));
        }
        Ok(())
    }
}

/// Generates a record set dated relative to today, optionally seeded.
///
/// Fails with a config error if `config` does not validate.
pub fn generate(config: &GeneratorConfig, seed: Option<u64>) -> Result<RecordSet> {
    config.validate()?;
    let today = Local::now().date_naive();
    let set = match seed {
        Some(seed) => generate_with(config, today, &mut StdRng::seed_from_u64(seed)),
        None => generate_with(config, today, &mut rand::rng()),
    };
    info!(
        "Generated {} synthetic orders for {} customers",
        set.len(),
        config.customer_pool
    );
    Ok(set)
}

/// Generates a record set ending at `today` using the given random source.
///
/// `config` must pass [`GeneratorConfig::validate`]; out-of-range floats make
/// the random source panic.
pub fn generate_with<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    today: NaiveDate,
    rng: &mut R,
) -> RecordSet {
    let (sales_lo, sales_hi) = config.sales_bounds();
    let window = u64::from(config.window_days);
    let pool = config.customer_pool.max(1);

    let records = (0..config.rows)
        .map(|i| {
            let days_back = window - rng.random_range(0..=window);
            let order_date = today.checked_sub_days(Days::new(days_back)).unwrap_or(today);
            let customer = rng.random_range(1..=pool);
            let region = REGIONS[rng.random_range(0..REGIONS.len())];
            let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];

            let sales = round_cents(rng.random_range(sales_lo..=sales_hi));
            let (margin_lo, margin_hi) = config.margin_for(category).bounds();
            let profit = round_cents(sales * rng.random_range(margin_lo..=margin_hi));

            OrderRecord {
                order_id: format!("ORD-{}", 1000 + i),
                order_date,
                customer_id: format!("CUST-{customer}"),
                region: region.to_string(),
                category: category.to_string(),
                sales,
                profit,
                extras: Vec::new(),
            }
        })
        .collect();

    RecordSet::new(records)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
