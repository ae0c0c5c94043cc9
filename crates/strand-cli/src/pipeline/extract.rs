//! Word extraction.

use regex::Regex;
use strand_runtime::node::{Emit, Transform};
use strand_runtime::{NodeError, SideInput};

/// Letters, optionally followed by an apostrophe and one lowercase letter.
const WORD_PATTERN: &str = "[a-zA-Z]+('[a-z])?";

/// Transform splitting each line into words.
#[derive(Debug, Clone)]
pub struct ExtractWords {
    pattern: Regex,
}

impl ExtractWords {
    /// Name of the single output slot.
    pub const WORDS: &'static str = "words";

    /// Compiles the word pattern.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(WORD_PATTERN)?,
        })
    }

    /// Returns the words of `line` in order of appearance.
    pub fn words<'a>(&'a self, line: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern.find_iter(line).map(|m| m.as_str())
    }
}

impl Transform<String> for ExtractWords {
    fn output_slots(&self) -> &[&str] {
        &[Self::WORDS]
    }

    fn validate(&self, side_inputs: usize) -> Result<(), String> {
        if side_inputs != 0 {
            return Err(format!("extract takes no side inputs, got {side_inputs}"));
        }
        Ok(())
    }

    fn process(
        &self,
        element: &String,
        _side_inputs: &[SideInput<String>],
    ) -> Result<Vec<Emit<String>>, NodeError> {
        Ok(self
            .words(element)
            .map(|word| Emit::to(0, word.to_owned()))
            .collect())
    }
}
