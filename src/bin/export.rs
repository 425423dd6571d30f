//! `tsb-export`: write one database column to a local text file.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsbridge::config::ExportConfig;
use tsbridge::export::ColumnExporter;

/// Query one column from the time-series database and write it to
/// `<sanitized-column-name>.txt` in the working directory.
#[derive(Parser, Debug)]
#[command(name = "tsb-export", version)]
struct Args {
    /// Column name to query
    column_name: String,

    /// Time-series database endpoint
    #[arg(long, env = "TSBRIDGE_DB_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Source table to select the column from
    #[arg(long, env = "TSBRIDGE_TABLE", default_value = "avid-wildflower-3446")]
    table: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let exporter = ColumnExporter::new(ExportConfig {
        endpoint: args.url,
        table: args.table,
    });
    let path = exporter
        .export(&args.column_name)
        .await
        .with_context(|| format!("exporting column {:?}", args.column_name))?;
    println!("wrote {}", path.display());
    Ok(())
}
