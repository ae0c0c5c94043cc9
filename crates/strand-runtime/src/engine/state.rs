//! Per-run bookkeeping shared by all runners.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::TRACING_TARGET;
use super::result::{ExecutionResult, ExecutionStats, TerminalReport};
use super::task::{NodeOutput, NodeRun, NodeTask};
use crate::error::NodeError;
use crate::graph::Graph;
use crate::node::NodeId;
use crate::stream::{SideInput, Stream, StreamRef};

/// Transient state of one run: materialized streams, failures and outcomes.
///
/// Streams are released as soon as their last consumer has run unless
/// intermediate retention is enabled.
pub(crate) struct RunState<T> {
    streams: HashMap<StreamRef, Stream<T>>,
    /// Consumers of each stream that have not run yet.
    pending_consumers: HashMap<StreamRef, usize>,
    /// Error recorded for every node that failed or was skipped.
    failures: HashMap<NodeId, NodeError>,
    /// Outcome of every terminal that was reached.
    outcomes: HashMap<NodeId, Result<(), NodeError>>,
    outputs: BTreeMap<String, Stream<T>>,
    /// Nodes that were run, skipped or cancelled.
    settled: HashSet<NodeId>,
    stats: ExecutionStats,
    retain_intermediate: bool,
    cancelled: bool,
}

impl<T: Clone> RunState<T> {
    /// Creates the state for a run of `graph` over `root`.
    pub fn new(graph: &Graph<T>, root: Stream<T>, retain_intermediate: bool) -> Self {
        let mut pending_consumers: HashMap<StreamRef, usize> = HashMap::new();
        for (_, node) in graph.nodes() {
            for input in node.inputs() {
                *pending_consumers.entry(input.clone()).or_default() += 1;
            }
        }

        let mut streams = HashMap::new();
        streams.insert(StreamRef::Root, root);

        Self {
            streams,
            pending_consumers,
            failures: HashMap::new(),
            outcomes: HashMap::new(),
            outputs: BTreeMap::new(),
            settled: HashSet::new(),
            stats: ExecutionStats::default(),
            retain_intermediate,
            cancelled: false,
        }
    }

    /// Materializes the inputs of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::UpstreamFailed`] when any producer failed or was
    /// skipped.
    pub fn prepare(&self, graph: &Graph<T>, id: NodeId) -> Result<NodeTask<T>, NodeError> {
        let node = graph.node(id);

        let main_input = node
            .main_input
            .as_ref()
            .map(|input| self.resolve(graph, input))
            .transpose()?;
        let side_inputs = node
            .side_inputs
            .iter()
            .map(|input| Ok(SideInput::new(input.clone(), self.resolve(graph, input)?)))
            .collect::<Result<Vec<_>, NodeError>>()?;

        Ok(NodeTask {
            id,
            name: node.name.clone(),
            kind: node.kind.clone(),
            main_input,
            side_inputs,
        })
    }

    fn resolve(&self, graph: &Graph<T>, input: &StreamRef) -> Result<Stream<T>, NodeError> {
        if let Some(producer) = input.producer()
            && let Some(error) = graph.node_id(producer).and_then(|id| self.failures.get(&id))
        {
            return Err(error.clone().upstream(producer));
        }

        self.streams
            .get(input)
            .cloned()
            .ok_or_else(|| NodeError::failed(format!("stream {input} was not materialized")))
    }

    /// Records a finished node run.
    pub fn complete(&mut self, graph: &Graph<T>, run: NodeRun<T>) {
        let node = graph.node(run.id);
        self.settled.insert(run.id);
        self.stats.nodes_run += 1;
        self.stats.elements_processed += run.elements;

        match run.output {
            Ok(NodeOutput::Streams(streams)) => {
                for (slot, stream) in node.kind.output_slots().iter().zip(streams) {
                    let reference = node.output(slot);
                    if self.retain_intermediate || self.has_consumers(&reference) {
                        self.streams.insert(reference, stream);
                    }
                }
            }
            Ok(NodeOutput::Checked) => {
                self.outcomes.insert(run.id, Ok(()));
            }
            Ok(NodeOutput::Collected(stream)) => {
                self.outputs.insert(node.name.clone(), stream);
                self.outcomes.insert(run.id, Ok(()));
            }
            Err(error) => {
                self.stats.nodes_failed += 1;
                self.fail(graph, run.id, error);
            }
        }

        self.release_inputs(graph, run.id);
    }

    /// Records a node that could not run because an input is unavailable.
    pub fn skip(&mut self, graph: &Graph<T>, id: NodeId, error: NodeError) {
        tracing::debug!(
            target: TRACING_TARGET,
            node = %graph.node(id).name,
            error = %error,
            "Node skipped"
        );

        self.stats.nodes_skipped += 1;
        self.fail(graph, id, error);
        self.release_inputs(graph, id);
    }

    /// Records a node that was never scheduled because the run was cancelled.
    pub fn cancel(&mut self, graph: &Graph<T>, id: NodeId) {
        self.cancelled = true;
        self.stats.nodes_skipped += 1;
        self.fail(graph, id, NodeError::Cancelled);
    }

    fn fail(&mut self, graph: &Graph<T>, id: NodeId, error: NodeError) {
        self.settled.insert(id);
        if graph.node(id).is_terminal() {
            self.outcomes.insert(id, Err(error.clone()));
        }
        self.failures.insert(id, error);
    }

    fn has_consumers(&self, reference: &StreamRef) -> bool {
        self.pending_consumers
            .get(reference)
            .is_some_and(|count| *count > 0)
    }

    /// Drops input streams whose last consumer was `id`.
    fn release_inputs(&mut self, graph: &Graph<T>, id: NodeId) {
        for input in graph.node(id).inputs() {
            let Some(count) = self.pending_consumers.get_mut(input) else {
                continue;
            };
            *count = count.saturating_sub(1);
            if *count == 0 && !self.retain_intermediate && !input.is_root() {
                self.streams.remove(input);
                tracing::trace!(target: TRACING_TARGET, stream = %input, "Released stream");
            }
        }
    }

    /// Returns whether `id` has been run, skipped or cancelled.
    pub fn is_settled(&self, id: NodeId) -> bool {
        self.settled.contains(&id)
    }

    /// Returns the number of streams currently held.
    #[cfg(test)]
    pub fn live_streams(&self) -> usize {
        self.streams.len()
    }

    /// Assembles the result; terminals appear in execution order.
    pub fn finish(mut self, graph: &Graph<T>) -> ExecutionResult<T> {
        let terminals = graph
            .terminals()
            .map(|id| TerminalReport {
                node: graph.node(id).name.clone(),
                outcome: self
                    .outcomes
                    .remove(&id)
                    .unwrap_or(Err(NodeError::Cancelled)),
            })
            .collect();

        ExecutionResult::new(terminals, self.outputs, self.stats, self.cancelled)
    }
}
