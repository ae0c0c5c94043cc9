//! Graph construction and the built, immutable graph.
//!
//! - [`GraphBuilder`]: collects nodes, validates wiring and computes a stable
//!   execution order
//! - [`Graph`]: the result, queried by runners and renderable as DOT

mod builder;
mod compiled;
mod dependency;
mod dot;

pub use builder::{GraphBuilder, NodeHandle};
pub use compiled::Graph;
pub use dependency::{Dependency, InputKind};

/// Tracing target for graph construction.
const TRACING_TARGET: &str = "strand_runtime::graph";
