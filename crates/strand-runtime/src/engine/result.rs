//! Execution results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, NodeError, Result};
use crate::stream::Stream;

/// Outcome of one terminal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalReport {
    /// Name of the terminal.
    pub node: String,
    /// `Ok` if the terminal succeeded, otherwise the error recorded for it.
    pub outcome: Result<(), NodeError>,
}

impl TerminalReport {
    /// Returns whether the terminal succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Counters collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Nodes whose function was invoked.
    pub nodes_run: usize,
    /// Nodes whose own function failed.
    pub nodes_failed: usize,
    /// Nodes skipped because an upstream node failed or the run was cancelled.
    pub nodes_skipped: usize,
    /// Main-input elements handed to transforms.
    pub elements_processed: usize,
}

/// Per-run record of every terminal's outcome and the collected outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult<T> {
    terminals: Vec<TerminalReport>,
    outputs: BTreeMap<String, Stream<T>>,
    stats: ExecutionStats,
    cancelled: bool,
}

impl<T> ExecutionResult<T> {
    pub(crate) fn new(
        terminals: Vec<TerminalReport>,
        outputs: BTreeMap<String, Stream<T>>,
        stats: ExecutionStats,
        cancelled: bool,
    ) -> Self {
        Self {
            terminals,
            outputs,
            stats,
            cancelled,
        }
    }

    /// Returns every terminal's report, in execution order.
    pub fn terminals(&self) -> &[TerminalReport] {
        &self.terminals
    }

    /// Returns the report of the terminal called `name`.
    pub fn terminal(&self, name: &str) -> Option<&TerminalReport> {
        self.terminals.iter().find(|report| report.node == name)
    }

    /// Returns the stream kept by the collect node called `name`.
    pub fn output(&self, name: &str) -> Option<&Stream<T>> {
        self.outputs.get(name)
    }

    /// Returns all collected outputs by collect-node name.
    pub fn outputs(&self) -> &BTreeMap<String, Stream<T>> {
        &self.outputs
    }

    /// Returns the run counters.
    pub fn stats(&self) -> ExecutionStats {
        self.stats
    }

    /// Returns whether the run was cancelled before every node was scheduled.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Returns whether every terminal succeeded.
    pub fn is_success(&self) -> bool {
        self.terminals.iter().all(TerminalReport::is_success)
    }

    /// Returns the first failing terminal, in execution order.
    pub fn first_failure(&self) -> Option<&TerminalReport> {
        self.terminals.iter().find(|report| !report.is_success())
    }

    /// Converts into an error if any terminal failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalFailed`] for the first failing terminal.
    pub fn into_result(self) -> Result<Self> {
        match self.first_failure() {
            Some(TerminalReport {
                node,
                outcome: Err(source),
            }) => Err(Error::TerminalFailed {
                node: node.clone(),
                source: source.clone(),
            }),
            _ => Ok(self),
        }
    }
}
