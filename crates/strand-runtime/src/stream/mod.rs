//! Element streams and the references that wire them together.
//!
//! A [`Stream`] is the fully materialized output of one node slot (or the root
//! input). It is immutable once produced and can be iterated once per consumer
//! without re-running its producer. A [`SideInput`] is a read-only snapshot of
//! a stream handed to a node alongside its main input.

mod side_input;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use derive_more::Display;
use serde::{Deserialize, Serialize};
pub use side_input::{Cursor, SideInput};

/// Element types that can flow through a graph.
///
/// Implemented for every type meeting the bounds; all streams of one graph
/// share a single element type.
pub trait Element: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> Element for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{}

/// Reference to a stream: the root input or one output slot of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Display)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamRef {
    /// The external input of the graph.
    #[display("root")]
    Root,
    /// A named output slot of a node.
    #[display("{node}.{slot}")]
    Output {
        /// Name of the producing node.
        node: String,
        /// Name of the output slot.
        slot: String,
    },
}

impl StreamRef {
    /// Returns a reference to the root input.
    #[inline]
    pub const fn root() -> Self {
        Self::Root
    }

    /// Returns a reference to `slot` of the node named `node`.
    ///
    /// The node does not need to exist yet; references are resolved when the
    /// graph is built.
    pub fn node(node: impl Into<String>, slot: impl Into<String>) -> Self {
        Self::Output {
            node: node.into(),
            slot: slot.into(),
        }
    }

    /// Returns the name of the producing node, or `None` for the root.
    pub fn producer(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Output { node, .. } => Some(node),
        }
    }

    /// Returns whether this is the root input.
    #[inline]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

/// An immutable, materialized sequence of elements.
///
/// Cloning is cheap: clones share the same backing storage.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Stream<T>(Arc<[T]>);

impl<T> Stream<T> {
    /// Creates an empty stream.
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the stream has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the elements in production order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Returns the elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

impl<T: Clone> Stream<T> {
    /// Copies the elements into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.0.to_vec()
    }
}

impl<T> Default for Stream<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Vec<T>> for Stream<T> {
    fn from(items: Vec<T>) -> Self {
        Self(Arc::from(items))
    }
}

impl<T> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a Stream<T> {
    type IntoIter = std::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
