//! Terminal consistency checks.

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::NodeError;
use crate::stream::SideInput;

/// A terminal function over fully materialized side inputs.
///
/// Checks run once per execution and produce no streams; only their outcome
/// is recorded.
pub trait Check<T>: Send + Sync {
    /// Checks the side-input wiring when the graph is built.
    fn validate(&self, side_inputs: usize) -> Result<(), String> {
        let _ = side_inputs;
        Ok(())
    }

    /// Runs the check.
    fn check(&self, side_inputs: &[SideInput<T>]) -> Result<(), NodeError>;
}

/// Verifies that every element of `smaller` occurs in `larger`.
///
/// `larger` is materialized into a set first; `smaller` is then walked in
/// order.
///
/// # Errors
///
/// Returns [`NodeError::SubsetViolation`] naming the first element of
/// `smaller` missing from `larger`.
pub fn check_subset<'a, T>(
    smaller: impl IntoIterator<Item = &'a T>,
    larger: impl IntoIterator<Item = &'a T>,
) -> Result<(), NodeError>
where
    T: Eq + Hash + std::fmt::Display + ?Sized + 'a,
{
    let larger: HashSet<&T> = larger.into_iter().collect();

    match smaller.into_iter().find(|element| !larger.contains(element)) {
        Some(element) => Err(NodeError::SubsetViolation {
            element: element.to_string(),
        }),
        None => Ok(()),
    }
}

/// Check that its first side input is a subset of its second.
#[derive(Debug, Clone, Copy, Default)]
pub struct Subset;

impl<T> Check<T> for Subset
where
    T: Eq + Hash + std::fmt::Display + Send + Sync,
{
    fn validate(&self, side_inputs: usize) -> Result<(), String> {
        if side_inputs != 2 {
            return Err(format!(
                "subset takes exactly two side inputs, got {side_inputs}"
            ));
        }
        Ok(())
    }

    fn check(&self, side_inputs: &[SideInput<T>]) -> Result<(), NodeError> {
        let [smaller, larger] = side_inputs else {
            return Err(NodeError::failed(format!(
                "subset takes exactly two side inputs, got {}",
                side_inputs.len()
            )));
        };
        check_subset(smaller.open(), larger.open())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamRef;

    fn side(items: &[&str]) -> SideInput<String> {
        SideInput::new(
            StreamRef::root(),
            items.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_subset_holds() {
        assert!(check_subset(&["a", "b"], &["b", "c", "a"]).is_ok());
        assert!(check_subset::<str>([], ["x"]).is_ok());
    }

    #[test]
    fn test_subset_reports_first_missing() {
        let result = check_subset(&["x", "y"], &["y"]);
        assert_eq!(
            result,
            Err(NodeError::SubsetViolation {
                element: "x".into()
            })
        );

        let result = check_subset(&["a", "q", "z"], &["a"]);
        assert_eq!(
            result,
            Err(NodeError::SubsetViolation {
                element: "q".into()
            })
        );
    }

    #[test]
    fn test_subset_ignores_multiplicity() {
        assert!(check_subset(&["a", "a", "a"], &["a"]).is_ok());
    }

    #[test]
    fn test_subset_check_node() {
        assert!(Subset.check(&[side(&["a"]), side(&["a", "b"])]).is_ok());
        assert!(matches!(
            Subset.check(&[side(&["b", "c"]), side(&["b"])]),
            Err(NodeError::SubsetViolation { element }) if element == "c"
        ));
    }

    #[test]
    fn test_subset_check_wiring() {
        let check: &dyn Check<String> = &Subset;
        assert!(check.validate(2).is_ok());
        assert!(check.validate(1).is_err());
        assert!(check.check(&[side(&["a"])]).is_err());
    }
}
