//! Classification of elements by length relative to a sample.

use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

use super::{Emit, Transform};
use crate::error::NodeError;
use crate::stream::SideInput;

/// Outcome of a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Size {
    /// Strictly shorter than the sample's average length.
    Small,
    /// At least as long as the sample's average length.
    Big,
}

impl Size {
    /// Output slot index used by [`Classify`].
    #[inline]
    pub const fn slot(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Big => 1,
        }
    }
}

/// An element tagged with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<T> {
    /// Which output the element belongs to.
    pub size: Size,
    /// The element itself.
    pub value: T,
}

/// Returns the truncated average byte length of `sample`, or `None` when the
/// sample is empty.
pub fn average_length<'a, S>(sample: impl IntoIterator<Item = &'a S>) -> Option<usize>
where
    S: AsRef<str> + ?Sized + 'a,
{
    let (count, total) = sample
        .into_iter()
        .fold((0usize, 0usize), |(count, total), item| {
            (count + 1, total + item.as_ref().len())
        });

    (count > 0).then(|| total / count)
}

/// Classifies `element` as small or big against the average length of
/// `sample`.
///
/// # Errors
///
/// Returns [`NodeError::EmptySample`] when `sample` has no elements.
pub fn classify<'a, T, S>(
    element: T,
    sample: impl IntoIterator<Item = &'a S>,
) -> Result<Classified<T>, NodeError>
where
    T: AsRef<str>,
    S: AsRef<str> + ?Sized + 'a,
{
    let average = average_length(sample).ok_or(NodeError::EmptySample)?;
    let size = if element.as_ref().len() < average {
        Size::Small
    } else {
        Size::Big
    };

    Ok(Classified {
        size,
        value: element,
    })
}

/// Transform routing each element to `small` or `big` against its single
/// side input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classify;

impl Classify {
    /// Name of the output slot for small elements.
    pub const SMALL: &'static str = "small";
    /// Name of the output slot for big elements.
    pub const BIG: &'static str = "big";
}

impl<T> Transform<T> for Classify
where
    T: AsRef<str> + Clone + Send + Sync,
{
    fn output_slots(&self) -> &[&str] {
        &[Self::SMALL, Self::BIG]
    }

    fn validate(&self, side_inputs: usize) -> Result<(), String> {
        if side_inputs != 1 {
            return Err(format!(
                "classify takes exactly one side input, got {side_inputs}"
            ));
        }
        Ok(())
    }

    fn process(
        &self,
        element: &T,
        side_inputs: &[SideInput<T>],
    ) -> Result<Vec<Emit<T>>, NodeError> {
        let sample = side_inputs
            .first()
            .ok_or_else(|| NodeError::failed("missing sample side input"))?;
        let classified = classify(element.clone(), sample.open())?;
        Ok(vec![Emit::to(classified.size.slot(), classified.value)])
    }
}
