//! Dependency edges between nodes.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// How a consumer reads the stream behind a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Processed element by element.
    #[display("main")]
    Main,
    /// Handed over as a materialized snapshot at the given position.
    #[display("side[{_0}]")]
    Side(usize),
}

/// Edge weight: the producer slot a consumer reads, and how.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display)]
#[display("{slot} ({kind})")]
pub struct Dependency {
    /// Output slot of the producer.
    pub slot: String,
    /// How the consumer reads it.
    pub kind: InputKind,
}
