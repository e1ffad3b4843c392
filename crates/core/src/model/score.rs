use serde::{Deserialize, Serialize};
use std::fmt;

/// Points earned out of the number of questions asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub points: u32,
    pub total: u32,
}

impl Score {
    #[must_use]
    pub fn new(points: u32, total: u32) -> Self {
        Self { points, total }
    }

    /// Share of correct answers in percent; `0.0` for an empty run.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.points) / f64::from(self.total) * 100.0
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.points, self.total)
    }
}
