//! Element-wise transformations.

use crate::error::NodeError;
use crate::stream::SideInput;

/// A value emitted to one of a transform's output slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emit<T> {
    /// Index into [`Transform::output_slots`].
    pub slot: usize,
    /// Emitted value.
    pub value: T,
}

impl<T> Emit<T> {
    /// Emits `value` to the slot at index `slot`.
    #[inline]
    pub const fn to(slot: usize, value: T) -> Self {
        Self { slot, value }
    }
}

/// An element-wise function with zero or more side inputs.
///
/// [`process`](Self::process) is called once per main-input element and must
/// not carry state from one call to the next. Results are tagged with the
/// output slot they belong to rather than pushed through per-slot callbacks.
pub trait Transform<T>: Send + Sync {
    /// Names of the output slots, indexed by [`Emit::slot`].
    fn output_slots(&self) -> &[&str];

    /// Checks the side-input wiring when the graph is built.
    fn validate(&self, side_inputs: usize) -> Result<(), String> {
        let _ = side_inputs;
        Ok(())
    }

    /// Processes one main-input element.
    fn process(&self, element: &T, side_inputs: &[SideInput<T>])
    -> Result<Vec<Emit<T>>, NodeError>;
}
