//! Line-oriented collaborators feeding and draining a graph.
//!
//! - [`LineSource`]: produces the root stream, one element per line
//! - [`LineSink`]: writes a stream, one element per line

mod file;

use std::path::PathBuf;

use async_trait::async_trait;
pub use file::{FileSink, FileSource};

use crate::error::Result;
use crate::stream::Stream;

/// Tracing target for I/O operations.
const TRACING_TARGET: &str = "strand_runtime::io";

/// Produces lines in source order, without line terminators.
#[async_trait]
pub trait LineSource: Send + Sync {
    /// Reads every line.
    async fn read_lines(&self) -> Result<Stream<String>>;
}

/// Writes named streams, one element per line.
#[async_trait]
pub trait LineSink: Send + Sync {
    /// Writes `lines` to the destination identified by `suffix` and returns
    /// where they went.
    async fn write_lines(&self, suffix: &str, lines: &Stream<String>) -> Result<PathBuf>;
}
