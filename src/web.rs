#![cfg(not(tarpaulin_include))]

use sheet_summary::app;
use sheet_summary::config::{ServerConfig, SummaryConfig};

/// Main entry point for the upload server
///
/// Reads `SHEET_SUMMARY_*` environment variables for the bind address,
/// database directory and summary pipeline, and logs through `env_logger`
/// (`RUST_LOG`, `info` by default).
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    app::run(ServerConfig::from_env(), SummaryConfig::from_env()).await
}
