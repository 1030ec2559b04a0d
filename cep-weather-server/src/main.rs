//! Binary crate for the `cep-weather` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - The HTTP surface over `cep-weather-core`

use clap::Parser;

mod cli;
mod http;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    telemetry::init(cmd.log_format)?;
    cmd.run().await
}
