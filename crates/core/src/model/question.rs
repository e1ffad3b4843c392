use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionOrdinal;
use crate::model::letters::{LetterError, LetterSet, OptionLetter};

/// Maximum number of answer options a question may carry.
pub const MAX_OPTIONS: usize = 15;

/// Explanation used when the source has no explanation for a question.
pub const DEFAULT_EXPLANATION: &str = "No explanation available.";

//
// ─── QUESTION KIND ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleSelect,
    MultiSelect,
}

impl QuestionKind {
    /// Maps the source's question type column; anything but `multi-select` is single-select.
    #[must_use]
    pub fn from_source(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("multi-select") {
            Self::MultiSelect
        } else {
            Self::SingleSelect
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleSelect => "multiple-choice",
            QuestionKind::MultiSelect => "multi-select",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a source row cannot become a `Question`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("no answer options")]
    NoOptions,

    #[error("{count} answer options, at most {MAX_OPTIONS} are supported")]
    TooManyOptions { count: usize },

    #[error("no correct answer given")]
    MissingCorrectResponse,

    #[error("invalid index '{0}'")]
    InvalidIndex(String),

    #[error("index '{index}' is outside the range of {option_count} options")]
    IndexOutOfRange { index: u32, option_count: usize },

    #[error(transparent)]
    Letter(#[from] LetterError),
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as read from a source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub ordinal: QuestionOrdinal,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    /// Comma-separated 1-based option indices, e.g. `"1, 3"`.
    pub correct_response: String,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, the option list is empty or too
    /// long, or the correct response is missing, non-numeric or out of range.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let options: Vec<String> = self.options.into_iter().map(|o| o.trim().to_string()).collect();
        if options.is_empty() || options.iter().any(String::is_empty) {
            return Err(QuestionError::NoOptions);
        }
        if options.len() > MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions {
                count: options.len(),
            });
        }

        let correct = parse_correct_response(&self.correct_response, options.len())?;

        let explanation = self
            .explanation
            .map(|e| e.trim().to_string())
            .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string());

        Ok(Question {
            ordinal: self.ordinal,
            text,
            kind: self.kind,
            options,
            correct,
            explanation,
        })
    }
}

fn parse_correct_response(raw: &str, option_count: usize) -> Result<BTreeSet<u32>, QuestionError> {
    let tokens: Vec<&str> = raw.split(',').map(str::trim).collect();
    if tokens.first().is_none_or(|first| first.is_empty()) {
        return Err(QuestionError::MissingCorrectResponse);
    }

    let mut indices = BTreeSet::new();
    for token in tokens {
        let index: u32 = token
            .parse()
            .map_err(|_| QuestionError::InvalidIndex(token.to_string()))?;
        let in_range = usize::try_from(index).is_ok_and(|i| (1..=option_count).contains(&i));
        if !in_range {
            return Err(QuestionError::IndexOutOfRange {
                index,
                option_count,
            });
        }
        indices.insert(index);
    }
    Ok(indices)
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A validated exam item.
///
/// Only the explanation may change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    ordinal: QuestionOrdinal,
    text: String,
    kind: QuestionKind,
    options: Vec<String>,
    correct: BTreeSet<u32>,
    explanation: String,
}

impl Question {
    #[must_use]
    pub fn ordinal(&self) -> QuestionOrdinal {
        self.ordinal
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// 1-based indices of the correct options, ascending.
    pub fn correct_option_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.correct.iter().copied()
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn set_explanation(&mut self, explanation: impl Into<String>) {
        self.explanation = explanation.into();
    }

    /// Options paired with their letters, in source order.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::Exhausted` if an option has no letter.
    pub fn lettered_options(&self) -> Result<Vec<(OptionLetter, &str)>, LetterError> {
        self.options
            .iter()
            .enumerate()
            .map(|(position, option)| Ok((OptionLetter::from_position(position)?, option.as_str())))
            .collect()
    }

    /// Letters of the correct options.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::Exhausted` if a correct index has no letter.
    pub fn correct_letters(&self) -> Result<LetterSet, LetterError> {
        self.correct
            .iter()
            .map(|&index| OptionLetter::from_index(index))
            .collect()
    }

    /// Last selectable letter for this question.
    ///
    /// # Errors
    ///
    /// Returns `LetterError` if the option count cannot be lettered.
    pub fn last_letter(&self) -> Result<OptionLetter, LetterError> {
        OptionLetter::last_for(self.options.len())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
