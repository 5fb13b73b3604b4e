//! Bulk Dispatch - Main entry point
//!
//! Reads a job file, drives a browser session through it and prints the
//! run summary.

use anyhow::{Context, Result};
use bulk_dispatch::{Config, DispatchEngine, DispatchJob, WebDriverTransport};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Send personalized messages to a contact list through the messaging web app.
#[derive(Debug, Parser)]
#[command(name = "bulk-dispatch", version, about)]
struct Cli {
    /// Job file (JSON): contacts, template or message, optional attachment
    job: PathBuf,

    /// Print the full run report as JSON instead of the status line
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // LOG_LEVEL comes from the config; RUST_LOG still wins when set.
    let loaded = Config::from_env();
    let level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout carries only the result.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let raw = std::fs::read_to_string(&cli.job)
        .with_context(|| format!("reading job file {}", cli.job.display()))?;
    let job: DispatchJob = serde_json::from_str(&raw)
        .with_context(|| format!("parsing job file {}", cli.job.display()))?;

    info!(
        contacts = job.contacts.len(),
        webdriver = %config.webdriver_url,
        "Job loaded"
    );

    let transport = Arc::new(WebDriverTransport::from_config(&config));
    let engine = DispatchEngine::new(transport, config.dispatch.clone());

    let cancel = engine.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current contact");
            cancel.cancel();
        }
    });

    let report = engine.run(&job).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.status_message());
    }

    let metrics = engine.metrics().summary();
    info!(
        navigations = metrics.navigations_total,
        strategy_attempts = metrics.strategy_attempts_total,
        sends = metrics.sends_total,
        "Run metrics"
    );

    if report.is_failed() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
