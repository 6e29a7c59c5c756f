//! Command-line argument parsing for Retail Insights.

use crate::config::Config;
use crate::segment::Segment;
use crate::store::StoreLocation;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Output format for reports and query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Retail sales analytics: ingest orders, report KPIs and segment customers.
#[derive(Parser, Debug)]
#[command(name = "retail-insights")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file (overrides config)
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "in_memory")]
    pub db: Option<PathBuf>,

    /// Use a non-persistent in-memory store
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<Option<PathBuf>>,

    /// Output format: text or json
    #[arg(long, global = true, value_name = "FORMAT", default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Load orders from a CSV file, replacing the stored table, and print the report
    Load {
        /// CSV file to load
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Text encoding label (defaults to the configured encoding)
        #[arg(long, value_name = "LABEL")]
        encoding: Option<String>,

        /// Field delimiter (defaults to the configured delimiter)
        #[arg(long, value_name = "CHAR")]
        delimiter: Option<char>,

        /// Number of top Gold customers to list
        #[arg(long, value_name = "N", default_value_t = 5)]
        top: usize,
    },

    /// Generate synthetic orders, replacing the stored table, and print the report
    Generate {
        /// Number of orders (defaults to the configured row count)
        #[arg(long, value_name = "N")]
        rows: Option<usize>,

        /// Seed for reproducible output
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Also write the generated orders to this CSV file
        #[arg(long, value_name = "PATH")]
        csv_out: Option<PathBuf>,

        /// Number of top Gold customers to list
        #[arg(long, value_name = "N", default_value_t = 5)]
        top: usize,
    },

    /// Print the report for the currently stored orders
    Report {
        /// Number of top Gold customers to list
        #[arg(long, value_name = "N", default_value_t = 5)]
        top: usize,
    },

    /// List the highest-value customers of one segment
    Customers {
        /// Segment to list: gold, silver or bronze
        #[arg(long, value_name = "SEGMENT", default_value = "gold")]
        segment: Segment,

        /// Number of customers to list
        #[arg(long, value_name = "N", default_value_t = 10)]
        top: usize,
    },

    /// Run a read-only SQL query against the orders table
    Query {
        /// SQL statement
        #[arg(value_name = "SQL")]
        sql: String,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the store location forced by flags, if any.
    pub fn store_override(&self) -> Option<StoreLocation> {
        if self.in_memory {
            Some(StoreLocation::Memory)
        } else {
            self.db.clone().map(StoreLocation::File)
        }
    }

    /// Returns the log file requested by `--log-file`.
    ///
    /// `Some(None)` means the flag was given without a path.
    pub fn log_target(&self) -> Option<Option<&Path>> {
        self.log_file.as_ref().map(|p| p.as_deref())
    }

    /// Applies flag overrides on top of file configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(location) = self.store_override() {
            config.store.path = Some(location.to_string());
        }
        match &self.command {
            Command::Load {
                encoding,
                delimiter,
                ..
            } => {
                if let Some(encoding) = encoding {
                    config.source.encoding = encoding.clone();
                }
                if let Some(delimiter) = delimiter {
                    config.source.delimiter = *delimiter;
                }
            }
            Command::Generate {
                rows: Some(rows), ..
            } => config.generator.rows = *rows,
            _ => {}
        }
    }
}
