//! Waypoint - Main Entry Point

mod app;
mod cli;
mod console_map;
mod track;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli::Cli::parse();
    tracing::info!("Starting Waypoint...");

    let ex = smol::LocalExecutor::new();
    smol::block_on(ex.run(app::run(&ex, cli)))
}
