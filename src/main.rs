//! Booker Verify - eventual-consistency checks for booking platform API tests
//!
//! Polls the booking platform until writes become visible and compares
//! entities field by field, reporting every difference at once.

use std::path::PathBuf;

use booker::common::config::Config;
use booker::common::logging;
use booker::{cli, commands};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(
    name = "booker",
    about = "Polling and structural checks for the booking platform API"
)]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (default: the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Also write detailed logs to the log directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_guard = if cli.log_file {
        logging::init_with_file().map(|(path, guard)| {
            tracing::info!(path = %path.display(), "Writing logs to file");
            guard
        })
    } else {
        logging::init_cli();
        None
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(mut config) => {
            if let Some(base_url) = cli.base_url {
                config.api.base_url = base_url;
            }
            cli::dispatch(cli.command, &config).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        // exit skips destructors; flush the file writer first
        drop(log_guard);
        std::process::exit(1);
    }
}
