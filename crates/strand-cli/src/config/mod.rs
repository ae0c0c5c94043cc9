//! CLI configuration.
//!
//! Every option can be given as a flag or through its environment variable.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! strand --input words.txt --output /tmp/pingpong/out. --runner parallel
//!
//! # Or via environment variables
//! STRAND_INPUT=words.txt STRAND_RUNNER=dot strand
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Parser;
use serde::{Deserialize, Serialize};
use strand_runtime::engine::{DEFAULT_MAX_CONCURRENT_NODES, ExecutorConfig, RunnerKind};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Default prefix of the output files.
pub const DEFAULT_OUTPUT: &str = "/tmp/pingpong/out.";

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "strand")]
#[command(about = "Classifies words by length and cross-checks two classification paths")]
#[command(version)]
#[must_use = "config does nothing unless you use it"]
pub struct Cli {
    /// Text file to read; every line is split into words.
    ///
    /// Required unless the `dot` runner is selected.
    #[arg(long, env = "STRAND_INPUT")]
    pub input: Option<PathBuf>,

    /// Prefix of the output files; `small` and `big` are appended.
    #[arg(long, env = "STRAND_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// Execution backend: `local`, `parallel` or `dot`.
    #[arg(long, env = "STRAND_RUNNER", default_value_t = RunnerKind::Local)]
    pub runner: RunnerKind,

    /// Maximum number of nodes the parallel runner keeps in flight.
    #[arg(long, env = "STRAND_MAX_CONCURRENT_NODES", default_value_t = DEFAULT_MAX_CONCURRENT_NODES)]
    pub max_concurrent_nodes: usize,

    /// File the `dot` runner writes the graph to; stdout when absent.
    #[arg(long, env = "STRAND_DOT_FILE")]
    pub dot_file: Option<PathBuf>,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so its values act as defaults for clap's
    /// `env` fallbacks.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.runner.executes() && self.input.is_none() {
            return Err(anyhow!("--input is required for the {} runner", self.runner));
        }
        if self.output.trim().is_empty() {
            return Err(anyhow!("--output must not be empty"));
        }
        if self.max_concurrent_nodes == 0 {
            return Err(anyhow!("--max-concurrent-nodes must be at least 1"));
        }
        if !self.runner.executes() && self.input.is_some() {
            tracing::warn!(
                target: TRACING_TARGET_CONFIG,
                runner = %self.runner,
                "Input is ignored by this runner"
            );
        }
        Ok(())
    }

    /// Returns the executor configuration for the selected runner.
    pub fn executor_config(&self) -> AnyhowResult<ExecutorConfig> {
        ExecutorConfig::builder()
            .max_concurrent_nodes(self.max_concurrent_nodes)
            .build()
            .map_err(|e| anyhow!("invalid executor configuration: {e}"))
    }

    /// Logs configuration and build information.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            input = ?self.input,
            output = %self.output,
            runner = %self.runner,
            max_concurrent_nodes = self.max_concurrent_nodes,
            dot_file = ?self.dot_file,
            "Pipeline configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
