use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identity of a question: its 1-based data-row position in the source.
///
/// The ordinal never changes after loading, no matter how questions are filtered,
/// shuffled or sliced for a run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionOrdinal(u32);

impl QuestionOrdinal {
    /// Creates a new `QuestionOrdinal`
    #[must_use]
    pub fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for QuestionOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionOrdinal({})", self.0)
    }
}

impl fmt::Display for QuestionOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an ordinal from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOrdinalError {
    raw: String,
}

impl fmt::Display for ParseOrdinalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse question ordinal from {:?}", self.raw)
    }
}

impl std::error::Error for ParseOrdinalError {}

impl FromStr for QuestionOrdinal {
    type Err = ParseOrdinalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(value) if value > 0 => Ok(QuestionOrdinal::new(value)),
            _ => Err(ParseOrdinalError { raw: s.to_string() }),
        }
    }
}
