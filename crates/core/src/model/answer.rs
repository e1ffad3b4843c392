use thiserror::Error;

use crate::model::ids::QuestionOrdinal;
use crate::model::letters::{LetterError, LetterSet};
use crate::model::question::Question;

/// Number of tries a user gets to type a well-formed answer.
pub const MAX_ANSWER_ATTEMPTS: u8 = 3;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("answer already settled")]
    AlreadySettled,
}

//
// ─── ANSWER RECORD ────────────────────────────────────────────────────────────
//

/// One scored interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    ordinal: QuestionOrdinal,
    chosen: LetterSet,
    correct: LetterSet,
    is_correct: bool,
}

impl AnswerRecord {
    /// Score `chosen` against the question's correct options.
    ///
    /// # Errors
    ///
    /// Returns `LetterError` if the question's correct indices cannot be lettered.
    pub fn score(question: &Question, chosen: LetterSet) -> Result<Self, LetterError> {
        let correct = question.correct_letters()?;
        let is_correct = chosen == correct;
        Ok(Self {
            ordinal: question.ordinal(),
            chosen,
            correct,
            is_correct,
        })
    }

    #[must_use]
    pub fn ordinal(&self) -> QuestionOrdinal {
        self.ordinal
    }

    #[must_use]
    pub fn chosen(&self) -> &LetterSet {
        &self.chosen
    }

    #[must_use]
    pub fn correct(&self) -> &LetterSet {
        &self.correct
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

//
// ─── ANSWER ATTEMPTS ──────────────────────────────────────────────────────────
//

/// Result of submitting one raw answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted(LetterSet),
    Retry { remaining: u8, error: LetterError },
    /// Out of attempts; the answer counts as an empty selection.
    Exhausted { error: LetterError },
}

/// Bounded retry policy for answer input.
///
/// Holds `attempts_remaining` and the accepted answer; a settled answer never
/// changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerAttempts {
    option_count: usize,
    attempts_remaining: u8,
    accepted: Option<LetterSet>,
}

impl AnswerAttempts {
    #[must_use]
    pub fn new(option_count: usize) -> Self {
        Self {
            option_count,
            attempts_remaining: MAX_ANSWER_ATTEMPTS,
            accepted: None,
        }
    }

    #[must_use]
    pub fn for_question(question: &Question) -> Self {
        Self::new(question.option_count())
    }

    /// Validate one raw answer.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::AlreadySettled` once an answer was accepted or the
    /// attempts ran out.
    pub fn submit(&mut self, raw: &str) -> Result<AttemptOutcome, AnswerError> {
        if self.accepted.is_some() {
            return Err(AnswerError::AlreadySettled);
        }

        match LetterSet::parse_answer(raw, self.option_count) {
            Ok(letters) => {
                self.accepted = Some(letters.clone());
                Ok(AttemptOutcome::Accepted(letters))
            }
            Err(error) => {
                self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
                if self.attempts_remaining == 0 {
                    self.accepted = Some(LetterSet::new());
                    Ok(AttemptOutcome::Exhausted { error })
                } else {
                    Ok(AttemptOutcome::Retry {
                        remaining: self.attempts_remaining,
                        error,
                    })
                }
            }
        }
    }

    /// Settle with an empty selection, e.g. when input ended.
    pub fn give_up(&mut self) -> LetterSet {
        self.attempts_remaining = 0;
        self.accepted.get_or_insert_with(LetterSet::new).clone()
    }

    #[must_use]
    pub fn attempts_remaining(&self) -> u8 {
        self.attempts_remaining
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.accepted.is_some()
    }

    #[must_use]
    pub fn accepted(&self) -> Option<&LetterSet> {
        self.accepted.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuestionOrdinal;
    use crate::model::question::{QuestionDraft, QuestionKind};

    fn question(kind: QuestionKind, correct: &str) -> Question {
        QuestionDraft {
            ordinal: QuestionOrdinal::new(1),
            text: "Q".into(),
            kind,
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_response: correct.into(),
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn scoring_is_set_equality() {
        let q = question(QuestionKind::MultiSelect, "3, 1");
        let right = AnswerRecord::score(&q, LetterSet::parse_answer("C A", 3).unwrap()).unwrap();
        assert!(right.is_correct());
        assert_eq!(right.correct().to_string(), "A, C");

        let partial = AnswerRecord::score(&q, LetterSet::parse_answer("A", 3).unwrap()).unwrap();
        assert!(!partial.is_correct());

        let extra = AnswerRecord::score(&q, LetterSet::parse_answer("A,B,C", 3).unwrap()).unwrap();
        assert!(!extra.is_correct());
    }

    #[test]
    fn first_valid_answer_is_accepted() {
        let mut attempts = AnswerAttempts::new(3);
        let outcome = attempts.submit("b").unwrap();
        assert_eq!(outcome, AttemptOutcome::Accepted(LetterSet::parse_answer("B", 3).unwrap()));
        assert!(attempts.is_settled());
        assert_eq!(attempts.submit("a").unwrap_err(), AnswerError::AlreadySettled);
    }

    #[test]
    fn three_invalid_answers_exhaust_to_empty() {
        let mut attempts = AnswerAttempts::new(3);
        assert!(matches!(
            attempts.submit("x").unwrap(),
            AttemptOutcome::Retry { remaining: 2, .. }
        ));
        assert!(matches!(
            attempts.submit("D").unwrap(),
            AttemptOutcome::Retry { remaining: 1, .. }
        ));
        assert!(matches!(
            attempts.submit("7").unwrap(),
            AttemptOutcome::Exhausted { .. }
        ));
        assert_eq!(attempts.accepted(), Some(&LetterSet::new()));
        assert_eq!(attempts.attempts_remaining(), 0);
    }

    #[test]
    fn retry_then_accept() {
        let mut attempts = AnswerAttempts::new(2);
        assert!(matches!(attempts.submit("Z").unwrap(), AttemptOutcome::Retry { .. }));
        assert!(matches!(attempts.submit("a").unwrap(), AttemptOutcome::Accepted(_)));
        assert_eq!(attempts.attempts_remaining(), 2);
    }

    #[test]
    fn give_up_settles_empty() {
        let mut attempts = AnswerAttempts::new(2);
        assert!(attempts.give_up().is_empty());
        assert!(attempts.is_settled());
    }
}
