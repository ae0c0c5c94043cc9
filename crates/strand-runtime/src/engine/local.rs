//! Single-threaded runner.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::TRACING_TARGET;
use super::config::ExecutorConfig;
use super::result::ExecutionResult;
use super::runner::Runner;
use super::state::RunState;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::stream::{Element, Stream};

/// Runs nodes one at a time in the graph's execution order, each on the
/// blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct LocalRunner {
    config: ExecutorConfig,
}

impl LocalRunner {
    /// Creates a local runner.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

#[async_trait]
impl<T: Element> Runner<T> for LocalRunner {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn execute(
        &self,
        graph: &Graph<T>,
        root: Stream<T>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult<T>> {
        let run_id = Uuid::now_v7();
        tracing::info!(
            target: TRACING_TARGET,
            run_id = %run_id,
            runner = "local",
            node_count = graph.node_count(),
            root_elements = root.len(),
            "Starting run"
        );

        let mut state = RunState::new(graph, root, self.config.retain_intermediate);

        for &id in graph.execution_order() {
            if cancel.is_cancelled() {
                state.cancel(graph, id);
                continue;
            }

            match state.prepare(graph, id) {
                Ok(task) => {
                    let run = tokio::task::spawn_blocking(move || task.run())
                        .await
                        .map_err(|e| Error::Internal(format!("node task failed: {e}")))?;
                    state.complete(graph, run);
                }
                Err(error) => state.skip(graph, id, error),
            }
        }

        let result = state.finish(graph);
        tracing::info!(
            target: TRACING_TARGET,
            run_id = %run_id,
            success = result.is_success(),
            cancelled = result.was_cancelled(),
            nodes_run = result.stats().nodes_run,
            nodes_failed = result.stats().nodes_failed,
            nodes_skipped = result.stats().nodes_skipped,
            "Run finished"
        );

        Ok(result)
    }
}
