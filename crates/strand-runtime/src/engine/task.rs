//! Execution of a single node against materialized inputs.

use std::sync::Arc;

use super::TRACING_TARGET;
use crate::error::NodeError;
use crate::node::{Check, NodeId, NodeKind, Transform};
use crate::stream::{SideInput, Stream};

/// Everything a node needs to run, detached from the graph so it can move to
/// another thread.
pub(crate) struct NodeTask<T> {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind<T>,
    pub main_input: Option<Stream<T>>,
    pub side_inputs: Vec<SideInput<T>>,
}

/// What a successful node produced.
pub(crate) enum NodeOutput<T> {
    /// One stream per declared output slot, in slot order.
    Streams(Vec<Stream<T>>),
    /// A check passed.
    Checked,
    /// A collect node kept its input.
    Collected(Stream<T>),
}

/// Result of running a [`NodeTask`].
pub(crate) struct NodeRun<T> {
    pub id: NodeId,
    pub elements: usize,
    pub output: Result<NodeOutput<T>, NodeError>,
}

impl<T: Clone> NodeTask<T> {
    /// Runs the node to completion.
    ///
    /// A transform error stops the node at the failing element and discards
    /// everything it emitted so far.
    pub fn run(self) -> NodeRun<T> {
        let (elements, output) = match &self.kind {
            NodeKind::Transform(transform) => self.run_transform(transform),
            NodeKind::Check(check) => (0, self.run_check(check)),
            NodeKind::Collect => (
                0,
                Ok(NodeOutput::Collected(
                    self.main_input.clone().unwrap_or_default(),
                )),
            ),
        };

        match &output {
            Ok(_) => tracing::debug!(
                target: TRACING_TARGET,
                node = %self.name,
                node_id = %self.id,
                elements,
                "Node completed"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET,
                node = %self.name,
                node_id = %self.id,
                elements,
                error = %error,
                "Node failed"
            ),
        }

        NodeRun {
            id: self.id,
            elements,
            output,
        }
    }

    fn run_transform(
        &self,
        transform: &Arc<dyn Transform<T>>,
    ) -> (usize, Result<NodeOutput<T>, NodeError>) {
        let main_input = self.main_input.clone().unwrap_or_default();
        let mut buffers: Vec<Vec<T>> = vec![Vec::new(); transform.output_slots().len()];
        let mut elements = 0;

        for element in main_input.iter() {
            elements += 1;
            let emitted = match transform.process(element, &self.side_inputs) {
                Ok(emitted) => emitted,
                Err(error) => return (elements, Err(error)),
            };
            for emit in emitted {
                let Some(buffer) = buffers.get_mut(emit.slot) else {
                    return (elements, Err(NodeError::InvalidSlot { slot: emit.slot }));
                };
                buffer.push(emit.value);
            }
        }

        let streams = buffers.into_iter().map(Stream::from).collect();
        (elements, Ok(NodeOutput::Streams(streams)))
    }

    fn run_check(&self, check: &Arc<dyn Check<T>>) -> Result<NodeOutput<T>, NodeError> {
        check.check(&self.side_inputs).map(|()| NodeOutput::Checked)
    }
}
