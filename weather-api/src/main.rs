//! Binary crate for the `weather-api` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading configuration
//! - Installing the tracing subscriber
//! - Running the HTTP server, or a one-off fetch

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
