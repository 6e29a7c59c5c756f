//! Fixed aggregate queries over the orders table and their row mappers.

use super::{CategoryPerformance, CustomerAggregate, RegionPerformance, Totals};
use crate::error::{InsightsError, Result};
use crate::store::{QueryResult, Value};

pub(crate) const TOTALS_SQL: &str = "\
SELECT SUM(Sales) AS Total_Sales, SUM(Profit) AS Total_Profit, COUNT(*) AS Order_Count
FROM orders";

pub(crate) const REGION_SQL: &str = "\
SELECT Region, SUM(Sales) AS Sales, SUM(Profit) AS Profit
FROM orders
GROUP BY Region
ORDER BY Profit DESC, Region ASC";

pub(crate) const CATEGORY_SQL: &str = "\
SELECT Category, SUM(Sales) AS Sales, SUM(Profit) AS Profit
FROM orders
GROUP BY Category
ORDER BY Sales DESC, Category ASC";

// Frequency counts distinct order ids, so a multi-line order counts once.
pub(crate) const CUSTOMER_SQL: &str = "\
SELECT
    Customer_ID,
    MAX(Order_Date) AS Last_Order_Date,
    COUNT(DISTINCT Order_ID) AS Frequency,
    SUM(Sales) AS Monetary
FROM orders
GROUP BY Customer_ID
ORDER BY Customer_ID";

/// Resolves result columns by name, failing loudly if a column is missing.
struct Columns<'a> {
    result: &'a QueryResult,
}

impl<'a> Columns<'a> {
    fn new(result: &'a QueryResult) -> Self {
        Self { result }
    }

    fn value(&self, row: usize, name: &str) -> Result<&'a Value> {
        self.result.get(row, name).ok_or_else(|| {
            InsightsError::internal(format!("Aggregate result is missing column '{name}'"))
        })
    }

    fn number(&self, row: usize, name: &str) -> Result<Option<f64>> {
        let value = self.value(row, name)?;
        match value {
            Value::Null => Ok(None),
            other => other.as_f64().map(Some).ok_or_else(|| {
                InsightsError::internal(format!("Column '{name}' is not numeric: {other}"))
            }),
        }
    }

    fn required_number(&self, row: usize, name: &str) -> Result<f64> {
        self.number(row, name)?
            .ok_or_else(|| InsightsError::internal(format!("Column '{name}' is NULL")))
    }

    fn text(&self, row: usize, name: &str) -> Result<String> {
        Ok(self.value(row, name)?.to_display_string())
    }
}

/// Maps the totals row; `None` when the table holds no orders.
pub(crate) fn map_totals(result: &QueryResult) -> Result<Option<Totals>> {
    if result.is_empty() {
        return Ok(None);
    }
    let cols = Columns::new(result);

    let Some(total_sales) = cols.number(0, "Total_Sales")? else {
        return Ok(None);
    };

    Ok(Some(Totals {
        total_sales,
        total_profit: cols.required_number(0, "Total_Profit")?,
        order_count: cols.required_number(0, "Order_Count")? as u64,
    }))
}

pub(crate) fn map_regions(result: &QueryResult) -> Result<Vec<RegionPerformance>> {
    let cols = Columns::new(result);
    (0..result.rows.len())
        .map(|i| {
            Ok(RegionPerformance {
                region: cols.text(i, "Region")?,
                sales: cols.required_number(i, "Sales")?,
                profit: cols.required_number(i, "Profit")?,
            })
        })
        .collect()
}

pub(crate) fn map_categories(result: &QueryResult) -> Result<Vec<CategoryPerformance>> {
    let cols = Columns::new(result);
    (0..result.rows.len())
        .map(|i| {
            Ok(CategoryPerformance {
                category: cols.text(i, "Category")?,
                sales: cols.required_number(i, "Sales")?,
                profit: cols.required_number(i, "Profit")?,
            })
        })
        .collect()
}

pub(crate) fn map_customers(result: &QueryResult) -> Result<Vec<CustomerAggregate>> {
    let cols = Columns::new(result);
    (0..result.rows.len())
        .map(|i| {
            Ok(CustomerAggregate {
                customer_id: cols.text(i, "Customer_ID")?,
                frequency: cols.required_number(i, "Frequency")? as u64,
                monetary: cols.required_number(i, "Monetary")?,
                last_order_date: cols.value(i, "Last_Order_Date")?.as_date(),
            })
        })
        .collect()
}
