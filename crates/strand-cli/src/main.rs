#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod pipeline;
mod shutdown;
mod telemetry;

use std::process;

use anyhow::Context;
use strand_runtime::io::{FileSink, FileSource};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "strand_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "strand_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "strand_cli::config";
pub const TRACING_TARGET_PIPELINE: &str = "strand_cli::pipeline";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();
    cli.validate().context("invalid configuration")?;

    let graph = pipeline::build_graph().context("failed to build pipeline")?;

    let Some(runner) = cli.runner.into_runner::<String>(cli.executor_config()?) else {
        return pipeline::render_dot(&graph, cli.dot_file.as_deref()).await;
    };

    let input = cli
        .input
        .as_deref()
        .context("--input is required when executing the pipeline")?;
    let source = FileSource::new(input);
    let sink = FileSink::new(cli.output.clone());

    let cancel = CancellationToken::new();
    let signal = tokio::spawn(shutdown::cancel_on_signal(cancel.clone()));

    let outcome = pipeline::execute(&graph, runner.as_ref(), &source, &sink, cancel).await;
    signal.abort();

    let result = outcome?;
    if result.was_cancelled() {
        anyhow::bail!("run was cancelled before all nodes completed");
    }
    result.into_result().context("pipeline check failed")?;

    Ok(())
}
