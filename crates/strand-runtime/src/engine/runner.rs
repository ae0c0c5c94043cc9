//! Execution backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tokio_util::sync::CancellationToken;

use super::config::ExecutorConfig;
use super::local::LocalRunner;
use super::parallel::ParallelRunner;
use super::result::ExecutionResult;
use crate::error::Result;
use crate::graph::Graph;
use crate::stream::{Element, Stream};

/// A backend able to execute a built [`Graph`].
///
/// Every backend honors the graph's dependency order and hands each node
/// fully materialized side inputs, so results never depend on the backend.
#[async_trait]
pub trait Runner<T: Element>: Send + Sync {
    /// Short name of the backend, used in logs.
    fn name(&self) -> &'static str;

    /// Executes `graph` over `root` and records every terminal's outcome.
    ///
    /// Node failures are recorded in the returned result rather than raised.
    /// Once `cancel` fires no further node is scheduled; nodes already running
    /// complete and unscheduled terminals are reported as cancelled.
    async fn execute(
        &self,
        graph: &Graph<T>,
        root: Stream<T>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult<T>>;

    /// Executes `graph` over `root` and fails if any terminal failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalFailed`](crate::Error::TerminalFailed) for the
    /// first failing terminal in execution order.
    async fn run(&self, graph: &Graph<T>, root: Stream<T>) -> Result<ExecutionResult<T>> {
        self.execute(graph, root, CancellationToken::new())
            .await?
            .into_result()
    }
}

/// Names of the available backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    /// In-process, one node at a time.
    #[default]
    Local,
    /// In-process, independent nodes on concurrent blocking tasks.
    Parallel,
    /// Renders the graph as Graphviz DOT instead of executing it.
    Dot,
}

impl RunnerKind {
    /// Returns whether this backend executes graphs.
    pub const fn executes(self) -> bool {
        !matches!(self, Self::Dot)
    }

    /// Creates the runner for this backend, or `None` for backends that only
    /// render the graph.
    pub fn into_runner<T: Element>(self, config: ExecutorConfig) -> Option<Box<dyn Runner<T>>> {
        match self {
            Self::Local => Some(Box::new(LocalRunner::new(config))),
            Self::Parallel => Some(Box::new(ParallelRunner::new(config))),
            Self::Dot => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_runner_kind_parsing() {
        assert_eq!(RunnerKind::from_str("local"), Ok(RunnerKind::Local));
        assert_eq!(RunnerKind::from_str("Parallel"), Ok(RunnerKind::Parallel));
        assert_eq!(RunnerKind::from_str("dot"), Ok(RunnerKind::Dot));
        assert!(RunnerKind::from_str("dataflow").is_err());
        assert_eq!(RunnerKind::default().to_string(), "local");
    }

    #[test]
    fn test_into_runner() {
        let config = ExecutorConfig::default();
        let local = RunnerKind::Local.into_runner::<String>(config.clone());
        assert_eq!(local.map(|r| r.name()), Some("local"));

        let parallel = RunnerKind::Parallel.into_runner::<String>(config.clone());
        assert_eq!(parallel.map(|r| r.name()), Some("parallel"));

        assert!(RunnerKind::Dot.into_runner::<String>(config).is_none());
        assert!(!RunnerKind::Dot.executes());
    }
}
