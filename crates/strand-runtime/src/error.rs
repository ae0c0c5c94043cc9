//! Runtime error types.
//!
//! Errors come in two layers:
//! - [`NodeError`]: raised while a single node runs. Recorded against that
//!   node's terminals in the [`ExecutionResult`] and never unwinds the runner.
//! - [`Error`]: build-time, I/O and run-level failures. Always propagated.
//!
//! [`ExecutionResult`]: crate::engine::ExecutionResult

use std::path::PathBuf;

use thiserror::Error;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by a node while it processes its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Average-length classification was attempted over an empty sample.
    #[error("empty sample")]
    EmptySample,

    /// An element of the expected-smaller stream is missing from the
    /// expected-larger stream.
    #[error("extra element: {element}")]
    SubsetViolation {
        /// First offending element, in stream order.
        element: String,
    },

    /// A transform emitted to a slot it never declared.
    #[error("emitted to undeclared output slot {slot}")]
    InvalidSlot {
        /// Index of the undeclared slot.
        slot: usize,
    },

    /// A node this one depends on failed, so it never ran.
    #[error("upstream node {node} failed: {cause}")]
    UpstreamFailed {
        /// Name of the node where the failure originated.
        node: String,
        /// Error raised by that node.
        cause: Box<NodeError>,
    },

    /// The run was cancelled before this node was scheduled.
    #[error("cancelled before execution")]
    Cancelled,

    /// Any other failure raised by a user-supplied function.
    #[error("{0}")]
    Failed(String),
}

impl NodeError {
    /// Creates a failure with a free-form message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wraps this error as seen from a node downstream of `origin`.
    ///
    /// Errors that already describe an upstream failure are passed through,
    /// so the originating node stays named however deep the chain goes.
    pub fn upstream(self, origin: impl Into<String>) -> Self {
        match self {
            upstream @ Self::UpstreamFailed { .. } => upstream,
            cause => Self::UpstreamFailed {
                node: origin.into(),
                cause: Box::new(cause),
            },
        }
    }

    /// Returns the error at the root of an upstream chain.
    pub fn root_cause(&self) -> &NodeError {
        match self {
            Self::UpstreamFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Errors that can occur while building or running a graph.
#[derive(Debug, Error)]
pub enum Error {
    /// The graph definition is structurally invalid.
    #[error("invalid graph definition: {0}")]
    InvalidDefinition(String),

    /// No topological order exists; `node` participates in a cycle.
    #[error("graph contains a cycle through node {node}")]
    CyclicGraph {
        /// Name of one node on the cycle.
        node: String,
    },

    /// The root input could not be read.
    #[error("failed to read {}: {source}", path.display())]
    SourceRead {
        /// Path of the source.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An output could not be written.
    #[error("failed to write {}: {source}", path.display())]
    SinkWrite {
        /// Path of the destination.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A terminal node failed; `node` is the first failing terminal.
    #[error("node {node} failed: {source}")]
    TerminalFailed {
        /// Name of the failing terminal.
        node: String,
        /// Error recorded for it.
        #[source]
        source: NodeError,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates an invalid definition error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDefinition(message.into())
    }
}
