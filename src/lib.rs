//! Retail Insights - sales analytics and customer segmentation.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod safety;
pub mod segment;
pub mod source;
pub mod store;
