//! Output formatting for reports and query results.
//!
//! Provides two formats: boxed text tables and pretty-printed JSON.

use crate::analytics::{DashboardReport, SegmentedCustomer};
use crate::cli::OutputFormat;
use crate::segment::Segment;
use crate::store::{ColumnInfo, QueryResult, Value};
use serde::Serialize;

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 3;

/// A plain-text table with box-drawing borders.
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from a query result.
    pub fn from_result(result: &QueryResult) -> Self {
        Self::new(
            result.columns.iter().map(|c| c.name.clone()).collect(),
            result
                .rows
                .iter()
                .map(|row| row.iter().map(Value::to_display_string).collect())
                .collect(),
        )
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| h.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates a string to `max_width` characters, adding an ellipsis.
    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let kept: String = s.chars().take(max_width - 3).collect();
            format!("{kept}...")
        }
    }

    fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(&mid.to_string()))
    }

    fn line(cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!(" {:width$} ", Self::truncate(cell, width), width = width)
            })
            .collect();
        format!("│{}│", padded.join("│"))
    }

    /// Renders the table, one line per entry.
    pub fn render_to_lines(&self) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths();

        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(Self::border(&widths, '┌', '┬', '┐'));
        lines.push(Self::line(&self.headers, &widths));
        lines.push(Self::border(&widths, '├', '┼', '┤'));
        for row in &self.rows {
            lines.push(Self::line(row, &widths));
        }
        lines.push(Self::border(&widths, '└', '┴', '┘'));
        lines
    }

    pub fn render(&self) -> String {
        let mut out = self.render_to_lines().join("\n");
        out.push('\n');
        out
    }
}

/// Formats a monetary amount with two decimals.
fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Formats a fraction as a percentage with one decimal.
fn percent(fraction: Option<f64>) -> String {
    match fraction {
        Some(f) => format!("{:.1}%", f * 100.0),
        None => "n/a".to_string(),
    }
}

/// JSON shape of a query result: one object per row keyed by column name.
#[derive(Debug, Serialize)]
struct JsonQueryOutput<'a> {
    columns: &'a [ColumnInfo],
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
    row_count: usize,
    duration_ms: u64,
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::String(s) => serde_json::Value::from(s.as_str()),
        Value::Date(d) => serde_json::Value::from(d.format("%Y-%m-%d").to_string()),
        Value::Bytes(b) => serde_json::Value::from(format!("<{} bytes>", b.len())),
    }
}

/// JSON shape of a report. `profit_margin_pct` is included alongside totals.
#[derive(Debug, Serialize)]
struct JsonReportOutput<'a> {
    #[serde(flatten)]
    report: &'a DashboardReport,
    profit_margin_pct: Option<f64>,
}

/// JSON shape of a segment listing.
#[derive(Debug, Serialize)]
struct JsonCustomersOutput<'a> {
    segment: Segment,
    customers: &'a [SegmentedCustomer],
}

/// Formats reports and query results.
pub struct Output {
    format: OutputFormat,
}

impl Output {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a report, or the no-data notice when nothing is loaded.
    pub fn report(&self, report: Option<&DashboardReport>) -> String {
        match (self.format, report) {
            (OutputFormat::Text, Some(report)) => format_report_text(report),
            (OutputFormat::Text, None) => "No orders loaded.\n".to_string(),
            (OutputFormat::Json, Some(report)) => to_json(&JsonReportOutput {
                report,
                profit_margin_pct: report.totals.profit_margin_pct(),
            }),
            (OutputFormat::Json, None) => to_json(&serde_json::Value::Null),
        }
    }

    /// Formats the top customers of one segment.
    pub fn customers(&self, segment: Segment, customers: &[SegmentedCustomer]) -> String {
        match self.format {
            OutputFormat::Text if customers.is_empty() => {
                format!("No {segment} customers.\n")
            }
            OutputFormat::Text => format!(
                "Top {segment} customers\n{}",
                customer_table(customers).render()
            ),
            OutputFormat::Json => to_json(&JsonCustomersOutput {
                segment,
                customers,
            }),
        }
    }

    /// Formats an ad hoc query result.
    pub fn query(&self, result: &QueryResult) -> String {
        match self.format {
            OutputFormat::Text => format!(
                "{}({} row{} in {}ms)\n",
                TextTable::from_result(result).render(),
                result.row_count,
                if result.row_count == 1 { "" } else { "s" },
                result.execution_time.as_millis()
            ),
            OutputFormat::Json => {
                let rows = result
                    .records()
                    .map(|record| {
                        record
                            .into_iter()
                            .map(|(name, value)| (name.to_string(), value_to_json(value)))
                            .collect()
                    })
                    .collect();
                to_json(&JsonQueryOutput {
                    columns: &result.columns,
                    rows,
                    row_count: result.row_count,
                    duration_ms: result.execution_time.as_millis() as u64,
                })
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    let mut out = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e));
    out.push('\n');
    out
}

fn format_report_text(report: &DashboardReport) -> String {
    let totals = &report.totals;
    let mut out = String::new();

    out.push_str("Key metrics\n");
    out.push_str(
        &TextTable::new(
            vec!["Metric".into(), "Value".into()],
            vec![
                vec!["Total Sales".into(), money(totals.total_sales)],
                vec!["Total Profit".into(), money(totals.total_profit)],
                vec![
                    "Profit Margin".into(),
                    percent(totals.profit_margin_pct().map(|p| p / 100.0)),
                ],
                vec!["Orders".into(), totals.order_count.to_string()],
            ],
        )
        .render(),
    );

    out.push_str("\nProfit by region\n");
    out.push_str(
        &TextTable::new(
            vec!["Region".into(), "Sales".into(), "Profit".into()],
            report
                .regions
                .iter()
                .map(|r| vec![r.region.clone(), money(r.sales), money(r.profit)])
                .collect(),
        )
        .render(),
    );

    out.push_str("\nSales by category\n");
    out.push_str(
        &TextTable::new(
            vec!["Category".into(), "Sales".into(), "Profit".into()],
            report
                .categories
                .iter()
                .map(|c| vec![c.category.clone(), money(c.sales), money(c.profit)])
                .collect(),
        )
        .render(),
    );

    out.push_str("\nCustomer segments\n");
    out.push_str(
        &TextTable::new(
            vec!["Segment".into(), "Customers".into(), "Share".into()],
            Segment::ALL
                .iter()
                .map(|&s| {
                    vec![
                        s.to_string(),
                        report.segments.count(s).to_string(),
                        percent(report.segments.share(s)),
                    ]
                })
                .collect(),
        )
        .render(),
    );

    out.push_str("\nTop Gold customers\n");
    if report.top_gold.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(&customer_table(&report.top_gold).render());
    }
    out
}

fn customer_table(customers: &[SegmentedCustomer]) -> TextTable {
    TextTable::new(
        vec![
            "Customer".into(),
            "Orders".into(),
            "Monetary".into(),
            "Last Order".into(),
        ],
        customers
            .iter()
            .map(|c| {
                vec![
                    c.aggregate.customer_id.clone(),
                    c.aggregate.frequency.to_string(),
                    money(c.aggregate.monetary),
                    c.aggregate
                        .last_order_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                ]
            })
            .collect(),
    )
}
