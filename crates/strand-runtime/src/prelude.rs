//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use strand_runtime::prelude::*;
//! ```

pub use crate::engine::{
    ExecutionResult, ExecutorConfig, LocalRunner, ParallelRunner, Runner, RunnerKind,
};
pub use crate::error::{Error, NodeError, Result};
pub use crate::graph::{Graph, GraphBuilder, NodeHandle};
pub use crate::io::{FileSink, FileSource, LineSink, LineSource};
pub use crate::node::{
    Check, Classify, Emit, Node, NodeId, NodeKind, Size, Subset, Transform, check_subset,
    classify,
};
pub use crate::stream::{Element, SideInput, Stream, StreamRef};
