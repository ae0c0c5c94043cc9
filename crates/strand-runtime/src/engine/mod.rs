//! Graph execution.
//!
//! This module provides the runners that execute a built [`Graph`]:
//! - [`Runner`]: the backend capability every runner implements
//! - [`LocalRunner`]: single-threaded, strict execution order
//! - [`ParallelRunner`]: independent branches on concurrent blocking tasks
//! - [`RunnerKind`]: selects a backend by name
//! - [`ExecutorConfig`]: configuration options
//!
//! [`Graph`]: crate::graph::Graph

mod config;
mod local;
mod parallel;
mod result;
mod runner;
mod state;
mod task;

pub use config::{DEFAULT_MAX_CONCURRENT_NODES, ExecutorConfig, ExecutorConfigBuilder};
pub use local::LocalRunner;
pub use parallel::ParallelRunner;
pub use result::{ExecutionResult, ExecutionStats, TerminalReport};
pub use runner::{Runner, RunnerKind};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "strand_runtime::engine";

#[cfg(test)]
mod tests;
