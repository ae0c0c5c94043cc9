//! Concurrent runner for independent branches.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::TRACING_TARGET;
use super::config::ExecutorConfig;
use super::result::ExecutionResult;
use super::runner::Runner;
use super::state::RunState;
use super::task::NodeRun;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::node::NodeId;
use crate::stream::{Element, Stream};

/// Runs every node whose inputs are ready on the blocking thread pool, at
/// most [`ExecutorConfig::max_concurrent_nodes`] at a time.
///
/// Node functions hold no shared mutable state, so the result is identical
/// to the one produced by [`LocalRunner`](super::LocalRunner).
#[derive(Debug, Clone, Default)]
pub struct ParallelRunner {
    config: ExecutorConfig,
}

impl ParallelRunner {
    /// Creates a parallel runner.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

/// Scheduling queue: nodes become ready once every producer has settled.
struct Schedule {
    /// Unsettled producer edges per node.
    waiting: Vec<usize>,
    /// Ready nodes keyed by their position in the execution order.
    ready: BTreeSet<(usize, NodeId)>,
    /// Position of each node in the execution order.
    position: Vec<usize>,
}

impl Schedule {
    fn new<T>(graph: &Graph<T>) -> Self {
        let mut position = vec![0; graph.node_count()];
        for (index, id) in graph.execution_order().iter().enumerate() {
            position[id.index()] = index;
        }

        let waiting: Vec<usize> = graph
            .nodes()
            .map(|(id, _)| graph.dependencies(id).count())
            .collect();

        let ready = graph
            .nodes()
            .filter(|(id, _)| waiting[id.index()] == 0)
            .map(|(id, _)| (position[id.index()], id))
            .collect();

        Self {
            waiting,
            ready,
            position,
        }
    }

    fn next(&mut self) -> Option<NodeId> {
        self.ready.pop_first().map(|(_, id)| id)
    }

    /// Marks `id` as settled and releases its dependents.
    fn settle<T>(&mut self, graph: &Graph<T>, id: NodeId) {
        for dependent in graph.dependents(id) {
            let waiting = &mut self.waiting[dependent.index()];
            *waiting -= 1;
            if *waiting == 0 {
                self.ready.insert((self.position[dependent.index()], dependent));
            }
        }
    }
}

#[async_trait]
impl<T: Element> Runner<T> for ParallelRunner {
    fn name(&self) -> &'static str {
        "parallel"
    }

    async fn execute(
        &self,
        graph: &Graph<T>,
        root: Stream<T>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult<T>> {
        let run_id = Uuid::now_v7();
        let max_in_flight = self.config.max_concurrent_nodes.max(1);
        tracing::info!(
            target: TRACING_TARGET,
            run_id = %run_id,
            runner = "parallel",
            node_count = graph.node_count(),
            root_elements = root.len(),
            max_concurrent_nodes = max_in_flight,
            "Starting run"
        );

        let mut state = RunState::new(graph, root, self.config.retain_intermediate);
        let mut schedule = Schedule::new(graph);
        let mut in_flight: JoinSet<NodeRun<T>> = JoinSet::new();
        let mut cancelled = false;

        loop {
            cancelled |= cancel.is_cancelled();
            while !cancelled && in_flight.len() < max_in_flight {
                let Some(id) = schedule.next() else {
                    break;
                };
                match state.prepare(graph, id) {
                    Ok(task) => {
                        tracing::trace!(
                            target: TRACING_TARGET,
                            node = %task.name,
                            in_flight = in_flight.len() + 1,
                            "Scheduling node"
                        );
                        in_flight.spawn_blocking(move || task.run());
                    }
                    Err(error) => {
                        state.skip(graph, id, error);
                        schedule.settle(graph, id);
                    }
                }
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                () = cancel.cancelled(), if !cancelled => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        run_id = %run_id,
                        in_flight = in_flight.len(),
                        "Cancellation requested, draining running nodes"
                    );
                    cancelled = true;
                }

                Some(joined) = in_flight.join_next() => {
                    let run = joined
                        .map_err(|e| Error::Internal(format!("node task failed: {e}")))?;
                    let id = run.id;
                    state.complete(graph, run);
                    schedule.settle(graph, id);
                }
            }
        }

        for &id in graph.execution_order() {
            if !state.is_settled(id) {
                state.cancel(graph, id);
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
