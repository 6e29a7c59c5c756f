//! Retail Insights - sales analytics and customer segmentation.

use retail_insights::analytics::Dashboard;
use retail_insights::cli::{Cli, Command};
use retail_insights::config::Config;
use retail_insights::error::Result;
use retail_insights::logging;
use retail_insights::output::Output;
use retail_insights::source;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    match cli.log_target() {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_to(&mut config);
    config.validate()?;

    info!("Opening order store at {}", config.store_location());
    let dashboard = Dashboard::open(&config).await?;
    let output = Output::new(cli.format);

    let result = execute(&dashboard, &config, &cli.command, &output).await;
    dashboard.close().await?;
    result
}

async fn execute(
    dashboard: &Dashboard,
    config: &Config,
    command: &Command,
    output: &Output,
) -> Result<()> {
    let top = match command {
        Command::Load { path, top, .. } => {
            let rows = dashboard.load_csv(path, &config.source).await?;
            info!("Loaded {} orders from {}", rows, path.display());
            *top
        }
        Command::Generate {
            seed, csv_out, top, ..
        } => {
            let records = dashboard.load_synthetic(&config.generator, *seed).await?;
            if let Some(csv_out) = csv_out {
                source::write_csv(csv_out, &records)?;
                info!("Wrote {} orders to {}", records.len(), csv_out.display());
            }
            *top
        }
        Command::Report { top } => *top,
        Command::Customers { segment, top } => {
            let customers = dashboard.top_customers(*segment, *top).await?;
            print!("{}", output.customers(*segment, &customers));
            return Ok(());
        }
        Command::Query { sql } => {
            let result = dashboard.query(sql).await?;
            print!("{}", output.query(&result));
            return Ok(());
        }
    };

    let report = dashboard.report(top).await?;
    print!("{}", output.report(report.as_ref()));
    Ok(())
}
