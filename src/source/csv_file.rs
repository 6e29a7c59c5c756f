//! Delimited file source.
//!
//! Reads order exports (e.g. the "Superstore" CSV) into the canonical record
//! set. Input bytes are decoded with a configurable WHATWG encoding label
//! before parsing, so exports from tools that default to Windows-1252 load
//! without decode errors.

use super::{normalize_column_name, OrderRecord, RecordSet, ORDER_COLUMNS, ORDER_HEADERS};
use crate::error::{InsightsError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Default encoding label, common for spreadsheet exports.
pub const DEFAULT_ENCODING: &str = "windows-1252";

const DATE_FORMATS: [&str; 1] = ["%Y-%m-%d"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Options controlling how delimited text is decoded and split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// WHATWG encoding label (`windows-1252`, `latin1`, `utf-8`, ...).
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Field delimiter byte.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

fn default_delimiter() -> char {
    ','
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            delimiter: default_delimiter(),
        }
    }
}

impl CsvOptions {
    /// Returns options with the given encoding label and default delimiter.
    pub fn with_encoding(encoding: impl Into<String>) -> Self {
        Self {
            encoding: encoding.into(),
            ..Self::default()
        }
    }

    /// Resolves the encoding label.
    pub fn resolve_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes()).ok_or_else(|| {
            InsightsError::config(format!("Unknown encoding label '{}'", self.encoding))
        })
    }

    pub(crate) fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                InsightsError::config(format!(
                    "Delimiter must be a single ASCII character, got '{}'",
                    self.delimiter
                ))
            })
    }
}

/// Loads a delimited file from disk into a record set.
///
/// Nothing is returned unless every row converts; any failure reports the
/// path and the underlying cause.
pub fn load_csv(path: &Path, options: &CsvOptions) -> Result<RecordSet> {
    let file = std::fs::File::open(path)
        .map_err(|e| InsightsError::data_source(path, format!("Failed to open file: {e}")))?;

    let set = read_csv(file, options).map_err(|e| e.with_path(path))?;

    info!(
        "Loaded {} orders from {} ({} extra columns)",
        set.len(),
        path.display(),
        set.extra_columns.len()
    );
    Ok(set)
}

/// Reads delimited text from any byte stream into a record set.
pub fn read_csv<R: Read>(mut reader: R, options: &CsvOptions) -> Result<RecordSet> {
    let encoding = options
        .resolve_encoding()
        .map_err(|e| InsightsError::stream_source(e.to_string()))?;
    let delimiter = options
        .delimiter_byte()
        .map_err(|e| InsightsError::stream_source(e.to_string()))?;

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| InsightsError::stream_source(format!("Failed to read input: {e}")))?;

    // BOM sniffing may override the configured encoding.
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(InsightsError::stream_source(format!(
            "Input is not valid {}; select a legacy encoding such as windows-1252",
            used.name()
        )));
    }
    debug!("Decoded {} bytes as {}", bytes.len(), used.name());

    parse_text(&text, delimiter)
}

/// Writes a record set as CSV with human-readable headers.
pub fn write_csv(path: &Path, set: &RecordSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| InsightsError::data_source(path, format!("Failed to create file: {e}")))?;

    let header = ORDER_HEADERS
        .iter()
        .map(|h| h.to_string())
        .chain(set.extra_columns.iter().cloned());
    writer
        .write_record(header)
        .map_err(|e| InsightsError::data_source(path, e.to_string()))?;

    for record in &set.records {
        let fields = [
            record.order_id.clone(),
            record.order_date.format("%Y-%m-%d").to_string(),
            record.customer_id.clone(),
            record.region.clone(),
            record.category.clone(),
            format!("{:.2}", record.sales),
            format!("{:.2}", record.profit),
        ];
        writer
            .write_record(fields.into_iter().chain(record.extras.iter().cloned()))
            .map_err(|e| InsightsError::data_source(path, e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| InsightsError::data_source(path, e.to_string()))?;

    info!("Wrote {} orders to {}", set.len(), path.display());
    Ok(())
}

/// Positions of the canonical and extra columns within a header row.
struct ColumnLayout {
    canonical: [usize; 7],
    extras: Vec<usize>,
    extra_names: Vec<String>,
}

impl ColumnLayout {
    fn resolve(headers: &[String]) -> Result<Self> {
        for (i, name) in headers.iter().enumerate() {
            if headers[..i].iter().any(|h| h.eq_ignore_ascii_case(name)) {
                return Err(InsightsError::stream_source(format!(
                    "Duplicate column '{name}'"
                )));
            }
        }

        let mut canonical = [0usize; 7];
        for (slot, column) in canonical.iter_mut().zip(ORDER_COLUMNS.iter()) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(column))
                .ok_or_else(|| {
                    InsightsError::stream_source(format!("Missing required column '{column}'"))
                })?;
        }

        let extras: Vec<usize> = (0..headers.len())
            .filter(|i| !canonical.contains(i))
            .collect();
        let extra_names = extras.iter().map(|&i| headers[i].clone()).collect();

        Ok(Self {
            canonical,
            extras,
            extra_names,
        })
    }

    fn parse_row(&self, row: &csv::StringRecord, line: u64) -> Result<OrderRecord> {
        let field = |slot: usize| row.get(self.canonical[slot]).unwrap_or("").trim();

        let order_date = parse_date(field(1)).ok_or_else(|| {
            InsightsError::stream_source(format!(
                "line {line}: cannot parse Order_Date value '{}' as a date",
                field(1)
            ))
        })?;
        let amount = |slot: usize| {
            parse_amount(field(slot)).ok_or_else(|| {
                InsightsError::stream_source(format!(
                    "line {line}: cannot parse {} value '{}' as a number",
                    ORDER_COLUMNS[slot],
                    field(slot)
                ))
            })
        };

        Ok(OrderRecord {
            order_id: field(0).to_string(),
            order_date,
            customer_id: field(2).to_string(),
            region: field(3).to_string(),
            category: field(4).to_string(),
            sales: amount(5)?,
            profit: amount(6)?,
            extras: self
                .extras
                .iter()
                .map(|&i| row.get(i).unwrap_or("").to_string())
                .collect(),
        })
    }
}

fn parse_text(text: &str, delimiter: u8) -> Result<RecordSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| InsightsError::stream_source(format!("Failed to read header row: {e}")))?
        .iter()
        .enumerate()
        .map(|(i, h)| match normalize_column_name(h) {
            name if name.is_empty() => format!("column_{i}"),
            name => name,
        })
        .collect();

    let layout = ColumnLayout::resolve(&headers)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row =
            result.map_err(|e| InsightsError::stream_source(format!("Malformed row: {e}")))?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        records.push(layout.parse_row(&row, line)?);
    }

    Ok(RecordSet {
        extra_columns: layout.extra_names,
        records,
    })
}

/// Coerces a date cell. Time-of-day components are dropped.
fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
    {
        return Some(datetime.date());
    }

    // US-style month/day/year; a two-digit year must not parse as year 00xx.
    let year = value.rsplit('/').next()?;
    let format = match year.len() {
        2 => "%m/%d/%y",
        4 => "%m/%d/%Y",
        _ => return None,
    };
    NaiveDate::parse_from_str(value, format).ok()
}

/// Coerces a monetary cell, accepting `$` prefixes and thousands separators.
fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
