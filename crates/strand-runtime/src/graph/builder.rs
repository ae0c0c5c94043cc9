//! Graph builder.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::TRACING_TARGET;
use super::compiled::Graph;
use super::dependency::{Dependency, InputKind};
use crate::error::{Error, Result};
use crate::node::{Node, NodeId, NodeKind};
use crate::stream::StreamRef;

/// Handle to a node added to a [`GraphBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    id: NodeId,
    name: String,
    slots: Vec<String>,
}

impl NodeHandle {
    /// Returns the node's ID.
    #[inline]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node's declared output slots.
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Returns a reference to the output slot `slot`.
    ///
    /// Undeclared slots are reported when the graph is built.
    pub fn output(&self, slot: &str) -> StreamRef {
        StreamRef::node(self.name.clone(), slot)
    }
}

/// Assembles nodes into a [`Graph`].
///
/// Nodes may reference streams of nodes that are added later; all references
/// are resolved and checked for cycles by [`build`](Self::build).
pub struct GraphBuilder<T> {
    nodes: Vec<Node<T>>,
    names: HashMap<String, NodeId>,
    composites: Vec<String>,
}

impl<T> GraphBuilder<T> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            names: HashMap::new(),
            composites: Vec::new(),
        }
    }

    /// Returns the number of nodes added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether no nodes were added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node.
    ///
    /// Nodes without an explicit composite label inherit the label of the
    /// enclosing [`composite`](Self::composite) scope, if any.
    ///
    /// # Errors
    ///
    /// Fails when a node with the same name was already added.
    pub fn add_node(&mut self, mut node: Node<T>) -> Result<NodeHandle> {
        if self.names.contains_key(&node.name) {
            return Err(Error::invalid(format!("duplicate node name: {}", node.name)));
        }

        if node.composite.is_none() && !self.composites.is_empty() {
            node.composite = Some(self.composites.join("/"));
        }

        let id = NodeId::new(self.nodes.len());
        let handle = NodeHandle {
            id,
            name: node.name.clone(),
            slots: node
                .kind
                .output_slots()
                .iter()
                .map(|slot| slot.to_string())
                .collect(),
        };

        tracing::trace!(
            target: TRACING_TARGET,
            node = %node.name,
            node_id = %id,
            kind = node.kind.label(),
            composite = ?node.composite,
            "Added node"
        );

        self.names.insert(node.name.clone(), id);
        self.nodes.push(node);
        Ok(handle)
    }

    /// Adds a transform reading `main` element by element with `side_inputs`
    /// as snapshots.
    pub fn add_transform(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind<T>,
        main: StreamRef,
        side_inputs: impl IntoIterator<Item = StreamRef>,
    ) -> Result<NodeHandle> {
        self.add_built(
            Node::builder()
                .with_name(name)
                .with_kind(kind)
                .with_main_input(main)
                .with_side_inputs(side_inputs.into_iter().collect::<Vec<_>>()),
        )
    }

    /// Adds a terminal check over `side_inputs`.
    pub fn add_check(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind<T>,
        side_inputs: impl IntoIterator<Item = StreamRef>,
    ) -> Result<NodeHandle> {
        self.add_built(
            Node::builder()
                .with_name(name)
                .with_kind(kind)
                .with_side_inputs(side_inputs.into_iter().collect::<Vec<_>>()),
        )
    }

    /// Adds a terminal keeping `input` as the run output called `name`.
    pub fn add_collect(&mut self, name: impl Into<String>, input: StreamRef) -> Result<NodeHandle> {
        self.add_built(
            Node::builder()
                .with_name(name)
                .with_kind(NodeKind::Collect)
                .with_main_input(input),
        )
    }

    fn add_built(&mut self, builder: crate::node::NodeBuilder<T>) -> Result<NodeHandle> {
        let node = builder.build().map_err(|e| Error::invalid(e.to_string()))?;
        self.add_node(node)
    }

    /// Runs `f` with every node it adds labelled as part of composite `name`.
    ///
    /// Scopes nest; nested labels are joined with `/`.
    pub fn composite<R>(
        &mut self,
        name: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.composites.push(name.into());
        let result = f(self);
        self.composites.pop();
        result
    }

    /// Validates all wiring and computes the execution order.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDefinition`] for missing or misdirected inputs,
    ///   references to unknown nodes or slots, wiring rejected by a node's
    ///   function, or a graph without terminals.
    /// - [`Error::CyclicGraph`] when no topological order exists.
    pub fn build(self) -> Result<Graph<T>> {
        if !self.nodes.iter().any(Node::is_terminal) {
            return Err(Error::invalid("graph must have at least one terminal node"));
        }

        for node in &self.nodes {
            self.validate_node(node)?;
        }

        let mut dag: DiGraph<NodeId, Dependency> = DiGraph::with_capacity(self.nodes.len(), 0);
        for index in 0..self.nodes.len() {
            dag.add_node(NodeId::new(index));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let inputs = node
                .main_input
                .iter()
                .map(|input| (input, InputKind::Main))
                .chain(
                    node.side_inputs
                        .iter()
                        .enumerate()
                        .map(|(position, input)| (input, InputKind::Side(position))),
                );

            for (input, kind) in inputs {
                let StreamRef::Output { node: producer, slot } = input else {
                    continue;
                };
                let producer = self.names[producer.as_str()];
                dag.add_edge(
                    NodeIndex::new(producer.index()),
                    NodeIndex::new(index),
                    Dependency {
                        slot: slot.clone(),
                        kind,
                    },
                );
            }
        }

        let order = self.execution_order(&dag)?;

        tracing::debug!(
            target: TRACING_TARGET,
            node_count = dag.node_count(),
            edge_count = dag.edge_count(),
            "Built graph"
        );

        Ok(Graph::new(self.nodes, self.names, dag, order))
    }

    /// Checks one node's inputs against its kind and the declared slots.
    fn validate_node(&self, node: &Node<T>) -> Result<()> {
        let side_inputs = node.side_inputs.len();
        let wiring = match &node.kind {
            NodeKind::Transform(transform) => {
                if node.main_input.is_none() {
                    return Err(Error::invalid(format!(
                        "transform {} has no main input",
                        node.name
                    )));
                }
                transform.validate(side_inputs)
            }
            NodeKind::Check(check) => {
                if node.main_input.is_some() {
                    return Err(Error::invalid(format!(
                        "check {} reads side inputs only",
                        node.name
                    )));
                }
                check.validate(side_inputs)
            }
            NodeKind::Collect => {
                if node.main_input.is_none() || side_inputs > 0 {
                    return Err(Error::invalid(format!(
                        "collect {} takes exactly one main input",
                        node.name
                    )));
                }
                Ok(())
            }
        };
        wiring.map_err(|message| Error::invalid(format!("node {}: {message}", node.name)))?;

        for input in node.inputs() {
            let StreamRef::Output { node: producer, slot } = input else {
                continue;
            };
            let Some(&producer_id) = self.names.get(producer) else {
                return Err(Error::invalid(format!(
                    "node {} reads {input} from unknown node {producer}",
                    node.name
                )));
            };
            let declared = self.nodes[producer_id.index()].kind.output_slots();
            if !declared.contains(&slot.as_str()) {
                return Err(Error::invalid(format!(
                    "node {} reads undeclared slot {input}",
                    node.name
                )));
            }
        }

        Ok(())
    }

    /// Computes a stable topological order, ties broken by insertion order,
    /// with terminals moved after every other node.
    fn execution_order(&self, dag: &DiGraph<NodeId, Dependency>) -> Result<Vec<NodeId>> {
        let mut in_degree: Vec<usize> = dag
            .node_indices()
            .map(|index| dag.neighbors_directed(index, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| Reverse(index))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(NodeId::new(index));
            for successor in dag.neighbors_directed(NodeIndex::new(index), Direction::Outgoing) {
                let degree = &mut in_degree[successor.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(successor.index()));
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(self.cycle_error(dag));
        }

        order.sort_by_key(|id| self.nodes[id.index()].is_terminal());
        Ok(order)
    }

    /// Names a node lying on a cycle.
    ///
    /// Within the cyclic component containing the earliest-added node, the
    /// earliest node reading a side input produced inside that component is
    /// preferred; otherwise the earliest member is named.
    fn cycle_error(&self, dag: &DiGraph<NodeId, Dependency>) -> Error {
        let component = petgraph::algo::tarjan_scc(dag)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || dag.contains_edge(component[0], component[0])
            })
            .min_by_key(|component| component.iter().map(|index| index.index()).min());

        let Some(component) = component else {
            return Error::Internal("topological sort stalled without a cycle".into());
        };

        let reads_side_input = |index: NodeIndex| {
            dag.edges_directed(index, Direction::Incoming).any(|edge| {
                matches!(edge.weight().kind, InputKind::Side(_))
                    && component.contains(&edge.source())
            })
        };
        let side_reader = component
            .iter()
            .copied()
            .filter(|&index| reads_side_input(index))
            .map(|index| index.index())
            .min();
        let Some(node) = side_reader.or_else(|| component.iter().map(|index| index.index()).min())
        else {
            return Error::Internal("empty cyclic component".into());
        };

        let name = self.nodes[node].name.clone();
        tracing::debug!(target: TRACING_TARGET, node = %name, "Rejected cyclic graph");
        Error::CyclicGraph { node: name }
    }
}

impl<T> Default for GraphBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeError;
    use crate::node::{Classify, Emit, Subset, Transform};
    use crate::stream::SideInput;

    /// Single-slot transform passing elements through.
    struct Identity;

    impl Transform<String> for Identity {
        fn output_slots(&self) -> &[&str] {
            &["out"]
        }

        fn process(
            &self,
            element: &String,
            _side_inputs: &[SideInput<String>],
        ) -> Result<Vec<Emit<String>>, NodeError> {
            Ok(vec![Emit::to(0, element.clone())])
        }
    }

    fn names(graph: &Graph<String>) -> Vec<&str> {
        graph
            .execution_order()
            .iter()
            .map(|&id| graph.node(id).name.as_str())
            .collect()
    }

    #[test]
    fn test_build_orders_dependencies_first() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_collect("sink", StreamRef::node("b", "out"))
            .unwrap();
        builder
            .add_transform("b", NodeKind::transform(Identity), StreamRef::node("a", "out"), [])
            .unwrap();
        builder
            .add_transform("a", NodeKind::transform(Identity), StreamRef::root(), [])
            .unwrap();

        let graph = builder.build().expect("acyclic");
        assert_eq!(names(&graph), vec!["a", "b", "sink"]);
    }

    #[test]
    fn test_build_breaks_ties_by_insertion() {
        let mut builder = GraphBuilder::<String>::new();
        for name in ["x", "y", "z"] {
            builder
                .add_transform(name, NodeKind::transform(Identity), StreamRef::root(), [])
                .unwrap();
        }
        builder.add_collect("out", StreamRef::node("z", "out")).unwrap();

        let graph = builder.build().expect("acyclic");
        assert_eq!(names(&graph), vec!["x", "y", "z", "out"]);
    }

    #[test]
    fn test_build_moves_terminals_last() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_transform("a", NodeKind::transform(Identity), StreamRef::root(), [])
            .unwrap();
        builder.add_collect("early", StreamRef::node("a", "out")).unwrap();
        builder
            .add_transform("b", NodeKind::transform(Identity), StreamRef::root(), [])
            .unwrap();

        let graph = builder.build().expect("acyclic");
        assert_eq!(names(&graph), vec!["a", "b", "early"]);
    }

    #[test]
    fn test_build_rejects_self_side_input() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_transform(
                "X",
                NodeKind::transform(Classify),
                StreamRef::root(),
                [StreamRef::node("X", "big")],
            )
            .unwrap();
        builder.add_collect("out", StreamRef::node("X", "small")).unwrap();

        let result = builder.build();
        assert!(matches!(result, Err(Error::CyclicGraph { node }) if node == "X"));
    }

    #[test]
    fn test_build_rejects_transitive_cycle() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_transform(
                "X",
                NodeKind::transform(Classify),
                StreamRef::root(),
                [StreamRef::node("Y", "big")],
            )
            .unwrap();
        builder
            .add_transform(
                "Y",
                NodeKind::transform(Classify),
                StreamRef::node("X", "small"),
                [StreamRef::root()],
            )
            .unwrap();
        builder.add_collect("out", StreamRef::node("Y", "small")).unwrap();

        let result = builder.build();
        assert!(matches!(result, Err(Error::CyclicGraph { node }) if node == "X"));
    }

    #[test]
    fn test_build_names_side_input_reader_on_cycle() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_transform(
                "Y",
                NodeKind::transform(Classify),
                StreamRef::node("X", "small"),
                [StreamRef::root()],
            )
            .unwrap();
        builder
            .add_transform(
                "X",
                NodeKind::transform(Classify),
                StreamRef::root(),
                [StreamRef::node("Y", "big")],
            )
            .unwrap();
        builder.add_collect("out", StreamRef::node("Y", "small")).unwrap();

        let result = builder.build();
        assert!(matches!(result, Err(Error::CyclicGraph { node }) if node == "X"));
    }

    #[test]
    fn test_build_accepts_stitched_side_inputs() {
        let mut builder = GraphBuilder::<String>::new();
        let words = StreamRef::root();
        let (a, b) = builder
            .composite("ping", |b| {
                let a = b.add_transform(
                    "A",
                    NodeKind::transform(Classify),
                    words.clone(),
                    [words.clone()],
                )?;
                let b2 = b.add_transform(
                    "B",
                    NodeKind::transform(Classify),
                    words.clone(),
                    [a.output(Classify::BIG)],
                )?;
                Ok((a, b2))
            })
            .unwrap();
        builder.add_collect("out", b.output(Classify::SMALL)).unwrap();

        let graph = builder.build().expect("acyclic");
        assert_eq!(graph.node(a.id()).composite.as_deref(), Some("ping"));
        assert_eq!(graph.composite("ping").map(<[_]>::len), Some(2));
        assert!(graph.node_by_name("out").unwrap().composite.is_none());
    }

    #[test]
    fn test_build_rejects_unknown_references() {
        let mut builder = GraphBuilder::<String>::new();
        builder.add_collect("out", StreamRef::node("ghost", "out")).unwrap();
        assert!(matches!(builder.build(), Err(Error::InvalidDefinition(_))));

        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_transform("a", NodeKind::transform(Identity), StreamRef::root(), [])
            .unwrap();
        builder.add_collect("out", StreamRef::node("a", "missing")).unwrap();
        assert!(matches!(builder.build(), Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn test_build_rejects_bad_wiring() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_transform("a", NodeKind::transform(Classify), StreamRef::root(), [])
            .unwrap();
        builder.add_collect("out", StreamRef::node("a", "small")).unwrap();
        assert!(matches!(builder.build(), Err(Error::InvalidDefinition(_))));

        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_check("check", NodeKind::check(Subset), [StreamRef::root()])
            .unwrap();
        assert!(matches!(builder.build(), Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn test_build_requires_terminal() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .add_transform("a", NodeKind::transform(Identity), StreamRef::root(), [])
            .unwrap();
        assert!(matches!(builder.build(), Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn test_add_node_rejects_duplicate_names() {
        let mut builder = GraphBuilder::<String>::new();
        builder.add_collect("out", StreamRef::root()).unwrap();
        assert!(builder.add_collect("out", StreamRef::root()).is_err());
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_nested_composites() {
        let mut builder = GraphBuilder::<String>::new();
        builder
            .composite("outer", |b| {
                b.composite("inner", |b| {
                    b.add_transform("a", NodeKind::transform(Identity), StreamRef::root(), [])
                })
            })
            .unwrap();
        builder.add_collect("out", StreamRef::node("a", "out")).unwrap();

        let graph = builder.build().unwrap();
        assert_eq!(
            graph.node_by_name("a").unwrap().composite.as_deref(),
            Some("outer/inner")
        );
    }
}
