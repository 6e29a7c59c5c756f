//! Logging configuration for Retail Insights.
//!
//! Logs go to stderr by default, keeping stdout free for reports and query
//! output. `--log-file` redirects them to a file in the platform state
//! directory.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to a file.
///
/// Location: `~/.local/state/retail-insights/retail-insights.log` on Linux
/// unless `path` overrides it. Falls back to stderr if the file cannot be
/// created.
pub fn init_file_logging(path: Option<&Path>) {
    let log_path = path.map(Path::to_path_buf).unwrap_or_else(get_log_path);

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging();
            return;
        }
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging();
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the default path for the log file.
///
/// Uses the XDG state directory on Linux, falling back to the config
/// directory and then the temp directory.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("retail-insights").join("retail-insights.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("retail-insights").join("retail-insights.log");
    }

    std::env::temp_dir().join("retail-insights.log")
}
