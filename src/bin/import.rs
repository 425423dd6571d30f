//! `tsb-import`: replay tracking-service run histories into the
//! time-series database.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsbridge::config::{ImportConfig, RetryPolicy};
use tsbridge::import::MetricsImporter;

/// Enumerate matching runs from the tracking service and log each run's
/// metric history into the database, one table per run.
#[derive(Parser, Debug)]
#[command(name = "tsb-import", version)]
struct Args {
    /// Experiment-tracking service endpoint
    #[arg(long, env = "TSBRIDGE_TRACKING_URL", default_value = "http://localhost:8000")]
    url: String,

    /// Time-series database endpoint
    #[arg(long, env = "TSBRIDGE_DB_URL", default_value = "http://localhost:8080")]
    db_url: String,

    /// Tracking-service project whose runs are imported
    #[arg(long, env = "TSBRIDGE_PROJECT", default_value = "entity-neural-network/enn-ppo")]
    project: String,

    /// Regular-expression filter on run configuration names
    #[arg(long, env = "TSBRIDGE_NAME_FILTER", default_value = "220511-055353-.*")]
    name_filter: String,

    /// Tracking-client request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Attempts allowed per run-enumeration pull before giving up
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ImportConfig {
        tracking_endpoint: args.url,
        db_endpoint: args.db_url,
        project: args.project,
        name_filter: args.name_filter,
        timeout: Duration::from_secs(args.timeout_secs),
        retry: RetryPolicy {
            max_attempts: args.max_attempts,
            ..RetryPolicy::default()
        },
        ..ImportConfig::default()
    };

    let mut importer = MetricsImporter::new(config).context("building importer")?;
    let summary = importer.import_all().await.context("importing runs")?;
    println!("{} runs, {} rows", summary.runs, summary.rows);
    println!("done");
    Ok(())
}
