//! Data source providers for Retail Insights.
//!
//! Both providers produce a [`RecordSet`] in the canonical order schema:
//! a delimited file reader that tolerates legacy single-byte encodings,
//! and a synthetic generator for demo data.

mod csv_file;
mod synthetic;

pub use csv_file::{load_csv, read_csv, write_csv, CsvOptions};
pub use synthetic::{generate, generate_with, GeneratorConfig, MarginRange};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized names of the canonical order columns, in table order.
pub const ORDER_COLUMNS: [&str; 7] = [
    "Order_ID",
    "Order_Date",
    "Customer_ID",
    "Region",
    "Category",
    "Sales",
    "Profit",
];

/// Human-readable headers of the canonical order columns, in table order.
pub const ORDER_HEADERS: [&str; 7] = [
    "Order ID",
    "Order Date",
    "Customer ID",
    "Region",
    "Category",
    "Sales",
    "Profit",
];

/// Regions drawn by the synthetic generator, in enumeration order.
pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// Product categories drawn by the synthetic generator.
pub const CATEGORIES: [&str; 3] = ["Furniture", "Office Supplies", "Technology"];

/// A single order line in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub customer_id: String,
    pub region: String,
    pub category: String,
    pub sales: f64,
    pub profit: f64,

    /// Values of the record set's extra columns, positionally aligned with
    /// [`RecordSet::extra_columns`].
    #[serde(default)]
    pub extras: Vec<String>,
}

/// The canonical record set shared by both source paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Normalized names of non-canonical columns carried as text.
    pub extra_columns: Vec<String>,

    /// Order rows in source order.
    pub records: Vec<OrderRecord>,
}

impl RecordSet {
    /// Creates a record set with only the canonical columns.
    pub fn new(records: Vec<OrderRecord>) -> Self {
        Self {
            extra_columns: Vec::new(),
            records,
        }
    }

    /// Returns the number of order rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no order rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the `sales` field across all rows.
    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.sales).sum()
    }

    /// Sum of the `profit` field across all rows.
    pub fn total_profit(&self) -> f64 {
        self.records.iter().map(|r| r.profit).sum()
    }
}

/// Normalizes a header so query text can reference it unquoted.
///
/// Every space and hyphen becomes an underscore: `Order ID` -> `Order_ID`,
/// `Sub-Category` -> `Sub_Category`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
