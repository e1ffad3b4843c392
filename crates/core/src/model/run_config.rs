use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::score::Score;

//
// ─── ENUMS ────────────────────────────────────────────────────────────────────
//

/// Policy used to choose the questions of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// Contiguous block of questions in source order.
    Range,
    /// Shuffle, then take the first `count`.
    Random,
    /// Re-run of the previous configuration with its original parameters.
    Replay,
}

impl SelectionMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMethod::Range => "range",
            SelectionMethod::Random => "random",
            SelectionMethod::Replay => "replay",
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMethod {
    type Err = RunConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "range" => Ok(Self::Range),
            "random" => Ok(Self::Random),
            "replay" => Ok(Self::Replay),
            other => Err(RunConfigError::UnknownValue(other.to_string())),
        }
    }
}

/// How feedback is given during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Feedback and explanation after every question.
    Practice,
    /// Silent scoring, mistakes reviewed at the end.
    Exam,
}

impl Mode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Practice => "practice",
            Mode::Exam => "exam",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Mode::Practice => "Practice",
            Mode::Exam => "Exam",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = RunConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "practice" => Ok(Self::Practice),
            "exam" => Ok(Self::Exam),
            other => Err(RunConfigError::UnknownValue(other.to_string())),
        }
    }
}

/// User-supplied seed for a reproducible random selection (number or free text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    /// Returns `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters of the selection, kept intact across replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Range { start: u32 },
    Random { seed: Option<Seed> },
}

impl Selection {
    #[must_use]
    pub fn method(&self) -> SelectionMethod {
        match self {
            Selection::Range { .. } => SelectionMethod::Range,
            Selection::Random { .. } => SelectionMethod::Random,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOrigin {
    Fresh,
    Replay,
}

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RunConfigError {
    #[error("no questions available")]
    NoQuestions,

    #[error("question count {count} must be between 1 and {total}")]
    CountOutOfRange { count: u32, total: u32 },

    #[error("range selection needs a start number")]
    MissingRangeStart,

    #[error("start number {start} must be between 1 and {max_start}")]
    RangeStartOutOfRange { start: u32, max_start: u32 },

    #[error("a replay cannot be configured directly")]
    ReplayNotConfigurable,

    #[error("unknown setting value '{0}'")]
    UnknownValue(String),
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// Unvalidated run parameters, as collected from prompts or storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfigDraft {
    pub method: SelectionMethod,
    pub mode: Mode,
    /// `None` means "all questions".
    pub count: Option<u32>,
    pub range_start: Option<u32>,
    pub seed: Option<String>,
}

impl RunConfigDraft {
    /// Validate against the number of available questions.
    ///
    /// # Errors
    ///
    /// Returns `RunConfigError` if the count or the range start does not fit
    /// `total`, or if the method is `Replay`.
    pub fn validate(self, total: usize) -> Result<RunConfiguration, RunConfigError> {
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        if total == 0 {
            return Err(RunConfigError::NoQuestions);
        }

        let count = self.count.unwrap_or(total);
        if count == 0 || count > total {
            return Err(RunConfigError::CountOutOfRange { count, total });
        }

        let selection = match self.method {
            SelectionMethod::Range => {
                let start = self.range_start.ok_or(RunConfigError::MissingRangeStart)?;
                let max_start = max_range_start(total, count);
                if start == 0 || start > max_start {
                    return Err(RunConfigError::RangeStartOutOfRange { start, max_start });
                }
                Selection::Range { start }
            }
            SelectionMethod::Random => Selection::Random {
                seed: self.seed.as_deref().and_then(Seed::parse),
            },
            SelectionMethod::Replay => return Err(RunConfigError::ReplayNotConfigurable),
        };

        Ok(RunConfiguration {
            selection,
            origin: RunOrigin::Fresh,
            mode: self.mode,
            count,
            last_score: None,
        })
    }
}

/// Highest valid range start for `count` questions out of `total`.
#[must_use]
pub fn max_range_start(total: u32, count: u32) -> u32 {
    total.saturating_sub(count).saturating_add(1)
}

//
// ─── RUN CONFIGURATION ────────────────────────────────────────────────────────
//

/// Validated parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    selection: Selection,
    origin: RunOrigin,
    mode: Mode,
    count: u32,
    last_score: Option<Score>,
}

impl RunConfiguration {
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn origin(&self) -> RunOrigin {
        self.origin
    }

    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.origin == RunOrigin::Replay
    }

    /// Method of this run; `Replay` for a replayed configuration.
    #[must_use]
    pub fn selection_method(&self) -> SelectionMethod {
        match self.origin {
            RunOrigin::Replay => SelectionMethod::Replay,
            RunOrigin::Fresh => self.selection.method(),
        }
    }

    /// Method the selection was originally configured with.
    #[must_use]
    pub fn original_method(&self) -> SelectionMethod {
        self.selection.method()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn range_start(&self) -> Option<u32> {
        match self.selection {
            Selection::Range { start } => Some(start),
            Selection::Random { .. } => None,
        }
    }

    /// Last question number of a range selection.
    #[must_use]
    pub fn range_end(&self) -> Option<u32> {
        self.range_start()
            .map(|start| start.saturating_add(self.count).saturating_sub(1))
    }

    #[must_use]
    pub fn seed(&self) -> Option<&Seed> {
        match &self.selection {
            Selection::Random { seed } => seed.as_ref(),
            Selection::Range { .. } => None,
        }
    }

    #[must_use]
    pub fn last_score(&self) -> Option<Score> {
        self.last_score
    }

    /// Mark this configuration as a replay of itself.
    #[must_use]
    pub fn into_replay(mut self) -> Self {
        self.origin = RunOrigin::Replay;
        self
    }

    /// Configuration to remember after a completed run.
    #[must_use]
    pub fn completed(mut self, score: Score) -> Self {
        self.origin = RunOrigin::Fresh;
        self.last_score = Some(score);
        self
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedRunSettings {
        PersistedRunSettings {
            selection_method: self.selection.method(),
            mode: self.mode,
            count: self.count,
            range_start: self.range_start(),
            seed: self.seed().map(|s| s.as_str().to_string()),
            last_score: self.last_score,
        }
    }
}

//
// ─── PERSISTED SHAPE ──────────────────────────────────────────────────────────
//

/// Storage shape of the remembered configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRunSettings {
    pub selection_method: SelectionMethod,
    pub mode: Mode,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<u32>,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_score: Option<Score>,
}

impl PersistedRunSettings {
    /// Rehydrate the configuration, re-validated against the current question count.
    ///
    /// # Errors
    ///
    /// Returns `RunConfigError` if the stored values no longer fit `total`.
    pub fn into_config(self, total: usize) -> Result<RunConfiguration, RunConfigError> {
        let last_score = self.last_score;
        let mut config = RunConfigDraft {
            method: self.selection_method,
            mode: self.mode,
            count: Some(self.count),
            range_start: self.range_start,
            seed: self.seed,
        }
        .validate(total)?;
        config.last_score = last_score;
        Ok(config)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
