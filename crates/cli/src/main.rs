mod allowed_paths;
mod cli;
mod config;
mod driver;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::CliArgs;
use crate::config::CliConfig;
use crate::driver::Driver;
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Load config
    let config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;

    // Initialize tracing: RUST_LOG > --debug > config log_level > "warn"
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if args.debug => tracing_subscriber::EnvFilter::new("debug"),
        Err(_) => tracing_subscriber::EnvFilter::new(config.log_level.as_deref().unwrap_or("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut driver = Driver::new(args, &config, Terminal::new())?;
    let code = driver.run().await?;
    std::process::exit(code);
}
