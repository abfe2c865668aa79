//! Binary entry point for `protoscan`.
//!
//! Probes one target and prints the decoded handshake as JSON on stdout.
//! Diagnostics go to stderr; any failure exits with status 1.

#![expect(clippy::print_stdout, reason = "the JSON report is the program output")]

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use protoscan::{
    cli::{AppConfig, Cli},
    logging::{self, DEFAULT_LOG_LEVEL},
    probe::{ProbeError, probe},
    report::ScanReport,
};
use tracing::error;

async fn run(config: &AppConfig) -> Result<()> {
    let result = probe(&config.target, &config.probe_options()).await?;
    let when = Utc::now();
    let report = ScanReport::new(config.target.clone(), when, result);
    let json = report
        .to_json(!config.compact)
        .context("failed to serialise report")?;
    println!("{json}");
    Ok(())
}

fn report_failure(err: &anyhow::Error) {
    let timed_out = err
        .downcast_ref::<ProbeError>()
        .is_some_and(ProbeError::is_timeout);
    let detail = format!("{err:#}");
    if timed_out {
        error!(error = %detail, "timed out waiting for server");
    } else {
        error!(error = %detail, "scan failed");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let loaded = Cli::load_from_iter(std::env::args_os());
    if let Some(usage) = loaded
        .as_ref()
        .err()
        .and_then(|err| err.downcast_ref::<clap::Error>())
    {
        usage.exit();
    }
    logging::init(
        loaded
            .as_ref()
            .map_or(DEFAULT_LOG_LEVEL, |cfg| cfg.log_level.as_str()),
    );

    let outcome = match loaded {
        Ok(config) => run(&config).await,
        Err(err) => Err(err),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}
