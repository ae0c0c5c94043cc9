//! Built dataflow graph.

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use super::dependency::Dependency;
use crate::node::{Node, NodeId};

/// An immutable, validated dataflow graph.
///
/// Created by [`GraphBuilder::build`](super::GraphBuilder::build). The graph
/// owns every node definition; stream contents only exist for the duration of
/// a run.
pub struct Graph<T> {
    /// Node definitions indexed by [`NodeId`].
    nodes: Vec<Node<T>>,
    /// Map from node names to IDs.
    names: HashMap<String, NodeId>,
    /// Producer → consumer edges, one per input reference.
    dag: DiGraph<NodeId, Dependency>,
    /// Stable topological order with terminals last.
    order: Vec<NodeId>,
    /// Composite labels and their members, in insertion order.
    composites: BTreeMap<String, Vec<NodeId>>,
}

impl<T> Graph<T> {
    pub(super) fn new(
        nodes: Vec<Node<T>>,
        names: HashMap<String, NodeId>,
        dag: DiGraph<NodeId, Dependency>,
        order: Vec<NodeId>,
    ) -> Self {
        let mut composites: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for (index, node) in nodes.iter().enumerate() {
            if let Some(label) = &node.composite {
                composites
                    .entry(label.clone())
                    .or_default()
                    .push(NodeId::new(index));
            }
        }

        Self {
            nodes,
            names,
            dag,
            order,
            composites,
        }
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of dependency edges between nodes.
    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    /// Returns a node by ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph.
    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.index()]
    }

    /// Returns a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node<T>> {
        self.names.get(name).map(|&id| self.node(id))
    }

    /// Returns the ID of the node called `name`.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Returns all nodes with their IDs, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::new(index), node))
    }

    /// Returns the execution order: every node after all of its
    /// dependencies, ties broken by insertion order, terminals last.
    pub fn execution_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Returns the terminal nodes in execution order.
    pub fn terminals(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.node(id).is_terminal())
    }

    /// Returns the producers `id` reads from, one entry per input edge.
    pub fn dependencies(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns the consumers of `id`'s outputs, one entry per input edge.
    pub fn dependents(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> impl Iterator<Item = NodeId> + '_ {
        self.dag
            .neighbors_directed(NodeIndex::new(id.index()), direction)
            .map(|index| self.dag[index])
    }

    /// Returns every composite label with its members.
    pub fn composites(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.composites
            .iter()
            .map(|(label, members)| (label.as_str(), members.as_slice()))
    }

    /// Returns the members of composite `label`.
    pub fn composite(&self, label: &str) -> Option<&[NodeId]> {
        self.composites.get(label).map(Vec::as_slice)
    }

    /// Returns the underlying dependency graph.
    pub fn inner(&self) -> &DiGraph<NodeId, Dependency> {
        &self.dag
    }
}

impl<T> std::fmt::Debug for Graph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.node_count())
            .field("edge_count", &self.edge_count())
            .field("composites", &self.composites.keys().collect::<Vec<_>>())
            .finish()
    }
}
