//! Node identifier type.

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};

/// Ordinal of a node within its graph, assigned in insertion order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("#{_0}")]
#[display("#{_0}")]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a node ID from an insertion ordinal.
    #[inline]
    pub const fn new(ordinal: usize) -> Self {
        Self(ordinal)
    }

    /// Returns the insertion ordinal.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}
