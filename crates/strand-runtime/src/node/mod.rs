//! Node definitions.
//!
//! A [`Node`] pairs a [`NodeKind`] with its wiring:
//! - **Transform**: one main input, zero or more side inputs, named output slots
//! - **Check**: terminal; reads side inputs only and records pass/fail
//! - **Collect**: terminal; exposes its main input as a run output

mod check;
mod classify;
mod id;
mod transform;

use std::sync::Arc;

pub use check::{Check, Subset, check_subset};
pub use classify::{Classified, Classify, Size, average_length, classify};
use derive_builder::Builder;
pub use id::NodeId;
pub use transform::{Emit, Transform};

use crate::stream::StreamRef;

/// The computation performed by a node.
pub enum NodeKind<T> {
    /// Element-wise function over the main input.
    Transform(Arc<dyn Transform<T>>),
    /// Terminal check over side inputs.
    Check(Arc<dyn Check<T>>),
    /// Terminal that keeps its main input as a named run output.
    Collect,
}

impl<T> NodeKind<T> {
    /// Creates a transform kind.
    pub fn transform(transform: impl Transform<T> + 'static) -> Self {
        Self::Transform(Arc::new(transform))
    }

    /// Creates a check kind.
    pub fn check(check: impl Check<T> + 'static) -> Self {
        Self::Check(Arc::new(check))
    }

    /// Returns whether nodes of this kind are terminals.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Transform(_))
    }

    /// Returns the declared output slots; terminals have none.
    pub fn output_slots(&self) -> &[&str] {
        match self {
            Self::Transform(transform) => transform.output_slots(),
            Self::Check(_) | Self::Collect => &[],
        }
    }

    /// Returns a short label for logs and graph rendering.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Transform(_) => "transform",
            Self::Check(_) => "check",
            Self::Collect => "collect",
        }
    }
}

impl<T> Clone for NodeKind<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Transform(transform) => Self::Transform(Arc::clone(transform)),
            Self::Check(check) => Self::Check(Arc::clone(check)),
            Self::Collect => Self::Collect,
        }
    }
}

impl<T> std::fmt::Debug for NodeKind<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeKind")
            .field("kind", &self.label())
            .field("output_slots", &self.output_slots())
            .finish()
    }
}

/// A node definition: what it computes and which streams feed it.
#[derive(Debug, Clone, Builder)]
#[builder(
    name = "NodeBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct Node<T> {
    /// Unique name of the node within its graph.
    pub name: String,
    /// Cosmetic grouping label; has no execution semantics.
    #[builder(default)]
    pub composite: Option<String>,
    /// The computation performed by the node.
    pub kind: NodeKind<T>,
    /// Stream processed element by element.
    #[builder(default)]
    pub main_input: Option<StreamRef>,
    /// Streams handed over as fully materialized snapshots, in order.
    #[builder(default)]
    pub side_inputs: Vec<StreamRef>,
}

impl<T> NodeBuilder<T> {
    fn validate(&self) -> Result<(), String> {
        match &self.name {
            None => return Err("name is required".into()),
            Some(name) if name.trim().is_empty() => return Err("name must not be empty".into()),
            Some(_) => {}
        }
        if self.kind.is_none() {
            return Err("kind is required".into());
        }
        Ok(())
    }
}

impl<T> Node<T> {
    /// Returns a builder for creating a node.
    pub fn builder() -> NodeBuilder<T> {
        NodeBuilder::default()
    }

    /// Returns whether this node is a terminal.
    pub const fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }

    /// Returns all input references, main input first.
    pub fn inputs(&self) -> impl Iterator<Item = &StreamRef> {
        self.main_input.iter().chain(self.side_inputs.iter())
    }

    /// Returns the reference to one of this node's output slots.
    pub fn output(&self, slot: &str) -> StreamRef {
        StreamRef::node(self.name.clone(), slot)
    }
}
