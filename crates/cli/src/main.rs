//! babashka pod watching filesystem paths
//!
//! The host starts this binary as a subprocess and talks to it over stdin and
//! stdout. Logs go to stderr.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::Parser;
use fswatch_core::config::Config;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pod-babashka-fswatcher")]
#[command(about = "Filesystem watcher pod for babashka")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate()?;

    init_logging(&config, cli.verbose)?;
    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    fswatch_protocol::serve(&config, std::io::stdin(), tokio::io::stdout())
        .await
        .context("Pod protocol failed")?;

    Ok(())
}

/// Initialize logging on stderr; stdout belongs to the pod protocol
fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_directives(config, verbose))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    Ok(())
}

fn default_directives(config: &Config, verbose: bool) -> String {
    if verbose {
        "fswatch_core=debug,fswatch_watcher=debug,fswatch_protocol=debug,pod_babashka_fswatcher=debug"
            .to_string()
    } else {
        config.logging.level.clone()
    }
}
