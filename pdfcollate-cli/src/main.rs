//! pdfcollate - Collate duplex scans from a watched directory.
//!
//! Runs until interrupted with Ctrl-C or SIGTERM.

mod cli;

use clap::Parser;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use pdfcollate::error::CollateError;
use pdfcollate::service;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "PDFCOLLATE_LOG";

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref());

    // Run the application and handle errors
    if let Err(err) = run(cli).await {
        error!(error = %err, "Exiting");
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), CollateError> {
    let config = cli.to_config()?;

    service::run(config, shutdown_signal()).await
}

/// Resolve the log filter: explicit flag, then PDFCOLLATE_LOG, then
/// RUST_LOG, then `info`.
fn log_filter(flag: Option<&str>) -> EnvFilter {
    flag.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_env(LOG_ENV).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_tracing(flag: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(flag))
        .with_target(false)
        .init();
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
