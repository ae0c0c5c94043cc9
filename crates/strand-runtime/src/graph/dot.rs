//! Graphviz rendering.

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};

use super::compiled::Graph;
use super::dependency::{Dependency, InputKind};
use crate::stream::StreamRef;

impl<T> Graph<T> {
    /// Renders the graph in Graphviz DOT format.
    ///
    /// Nodes are labelled `composite/name [kind]`; the root input appears as
    /// an extra `root` node.
    pub fn to_dot(&self) -> String {
        let mut rendered: DiGraph<String, Dependency> = DiGraph::new();
        let root = rendered.add_node("root".to_owned());

        for (_, node) in self.nodes() {
            let label = match &node.composite {
                Some(composite) => format!("{composite}/{} [{}]", node.name, node.kind.label()),
                None => format!("{} [{}]", node.name, node.kind.label()),
            };
            rendered.add_node(label);
        }

        // Rendered indices are shifted by one for the root.
        for edge in self.inner().edge_indices() {
            let Some((from, to)) = self.inner().edge_endpoints(edge) else {
                continue;
            };
            rendered.add_edge(
                NodeIndex::new(from.index() + 1),
                NodeIndex::new(to.index() + 1),
                self.inner()[edge].clone(),
            );
        }

        for (id, node) in self.nodes() {
            let root_inputs = node
                .main_input
                .iter()
                .map(|input| (input, InputKind::Main))
                .chain(
                    node.side_inputs
                        .iter()
                        .enumerate()
                        .map(|(position, input)| (input, InputKind::Side(position))),
                )
                .filter(|(input, _)| input.is_root());

            for (_, kind) in root_inputs {
                rendered.add_edge(
                    root,
                    NodeIndex::new(id.index() + 1),
                    Dependency {
                        slot: StreamRef::Root.to_string(),
                        kind,
                    },
                );
            }
        }

        format!("{}", Dot::new(&rendered))
    }
}
