#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod engine;
mod error;
pub mod graph;
pub mod io;
pub mod node;
mod stream;

#[doc(hidden)]
pub mod prelude;

pub use error::{Error, NodeError, Result};
pub use stream::{Cursor, Element, SideInput, Stream, StreamRef};

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "strand_runtime";
