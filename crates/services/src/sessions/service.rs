use std::fmt;

use exam_core::model::{
    AnswerAttempts, AnswerRecord, AttemptOutcome, LetterError, LetterSet, Mode, Question, Score,
};

use crate::error::SessionError;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Where the session currently stands for the question under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Presenting,
    AwaitingAnswer,
    Scored,
    AnnotationEdit,
    Complete,
}

impl SessionPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Presenting => "presenting",
            SessionPhase::AwaitingAnswer => "awaiting an answer",
            SessionPhase::Scored => "scored",
            SessionPhase::AnnotationEdit => "editing an explanation",
            SessionPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStep {
    /// Input was malformed; the same question waits for another try.
    Retry { remaining: u8, error: LetterError },
    /// The question is scored. `rejected` holds the last error when the
    /// attempts ran out and the answer defaulted to an empty selection.
    Scored {
        record: AnswerRecord,
        rejected: Option<LetterError>,
    },
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Final state of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub questions: Vec<Question>,
    pub records: Vec<AnswerRecord>,
    pub score: Score,
}

impl SessionOutcome {
    /// Questions paired with their records, in presentation order.
    pub fn entries(&self) -> impl Iterator<Item = (&Question, &AnswerRecord)> + '_ {
        self.questions.iter().zip(&self.records)
    }

    pub fn mistakes(&self) -> impl Iterator<Item = (&Question, &AnswerRecord)> + '_ {
        self.entries().filter(|(_, record)| !record.is_correct())
    }

    #[must_use]
    pub fn is_flawless(&self) -> bool {
        self.records.iter().all(AnswerRecord::is_correct)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory exam session over an already selected list of questions.
///
/// Steps through the questions in order:
/// `Presenting → AwaitingAnswer → Scored → (AnnotationEdit) → Presenting`, and
/// ends in `Complete`. The session owns its question copies, so explanation
/// edits are visible for the rest of the run and in the outcome.
pub struct ExamSession {
    mode: Mode,
    questions: Vec<Question>,
    current: usize,
    phase: SessionPhase,
    attempts: Option<AnswerAttempts>,
    records: Vec<AnswerRecord>,
    points: u32,
}

impl ExamSession {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>, mode: Mode) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            mode,
            questions,
            current: 0,
            phase: SessionPhase::Presenting,
            attempts: None,
            records: Vec::new(),
            points: 0,
        })
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// 1-based position of the current question.
    #[must_use]
    pub fn position(&self) -> usize {
        (self.current + 1).min(self.questions.len())
    }

    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    /// Attempts left for the question awaiting an answer.
    #[must_use]
    pub fn attempts_remaining(&self) -> Option<u8> {
        self.attempts.as_ref().map(AnswerAttempts::attempts_remaining)
    }

    fn expect_phase(&self, expected: SessionPhase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            return Ok(());
        }
        if self.phase == SessionPhase::Complete {
            return Err(SessionError::Completed);
        }
        Err(SessionError::InvalidPhase {
            action,
            phase: self.phase.as_str(),
        })
    }

    /// Mark the current question as shown and start accepting answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is presenting.
    pub fn begin_answer(&mut self) -> Result<&Question, SessionError> {
        self.expect_phase(SessionPhase::Presenting, "accept an answer")?;
        let question = self.questions.get(self.current).ok_or(SessionError::Completed)?;
        self.attempts = Some(AnswerAttempts::for_question(question));
        self.phase = SessionPhase::AwaitingAnswer;
        Ok(question)
    }

    /// Validate one raw answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless an answer is awaited, or
    /// `SessionError::Letter` if the question's answer key cannot be lettered.
    pub fn submit_answer(&mut self, raw: &str) -> Result<AnswerStep, SessionError> {
        self.expect_phase(SessionPhase::AwaitingAnswer, "submit an answer")?;
        let attempts = self.attempts.as_mut().ok_or(SessionError::InvalidPhase {
            action: "submit an answer",
            phase: SessionPhase::Presenting.as_str(),
        })?;

        match attempts.submit(raw)? {
            AttemptOutcome::Retry { remaining, error } => Ok(AnswerStep::Retry { remaining, error }),
            AttemptOutcome::Accepted(chosen) => Ok(AnswerStep::Scored {
                record: self.score_current(chosen)?,
                rejected: None,
            }),
            AttemptOutcome::Exhausted { error } => Ok(AnswerStep::Scored {
                record: self.score_current(LetterSet::new())?,
                rejected: Some(error),
            }),
        }
    }

    /// Settle the current question with an empty answer, e.g. when input ended.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless an answer is awaited.
    pub fn abandon_answer(&mut self) -> Result<AnswerRecord, SessionError> {
        self.expect_phase(SessionPhase::AwaitingAnswer, "abandon an answer")?;
        let chosen = self
            .attempts
            .as_mut()
            .map_or_else(LetterSet::new, AnswerAttempts::give_up);
        self.score_current(chosen)
    }

    fn score_current(&mut self, chosen: LetterSet) -> Result<AnswerRecord, SessionError> {
        let question = self.questions.get(self.current).ok_or(SessionError::Completed)?;
        let record = AnswerRecord::score(question, chosen)?;
        if record.is_correct() {
            self.points += 1;
        }
        self.records.push(record.clone());
        self.attempts = None;
        self.phase = SessionPhase::Scored;
        Ok(record)
    }

    /// Open an explanation edit for the question just scored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EditNotAllowed` in exam mode, or
    /// `SessionError::InvalidPhase` unless the current question is scored.
    pub fn begin_edit(&mut self) -> Result<&Question, SessionError> {
        if self.mode != Mode::Practice {
            return Err(SessionError::EditNotAllowed);
        }
        self.expect_phase(SessionPhase::Scored, "edit an explanation")?;
        self.phase = SessionPhase::AnnotationEdit;
        self.questions.get(self.current).ok_or(SessionError::Completed)
    }

    /// Replace the current explanation after it was stored durably.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless an edit is open.
    pub fn apply_explanation(&mut self, explanation: impl Into<String>) -> Result<&Question, SessionError> {
        self.expect_phase(SessionPhase::AnnotationEdit, "apply an explanation")?;
        let question = self
            .questions
            .get_mut(self.current)
            .ok_or(SessionError::Completed)?;
        question.set_explanation(explanation);
        self.phase = SessionPhase::Scored;
        Ok(question)
    }

    /// Close an edit and keep the old explanation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless an edit is open.
    pub fn cancel_edit(&mut self) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::AnnotationEdit, "cancel an edit")?;
        self.phase = SessionPhase::Scored;
        Ok(())
    }

    /// Move on to the next question, or complete the session after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the current question is scored.
    pub fn advance(&mut self) -> Result<SessionPhase, SessionError> {
        self.expect_phase(SessionPhase::Scored, "advance")?;
        self.current += 1;
        self.phase = if self.current >= self.questions.len() {
            SessionPhase::Complete
        } else {
            SessionPhase::Presenting
        };
        Ok(self.phase)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` if questions are still unanswered.
    pub fn finish(self) -> Result<SessionOutcome, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::NotComplete);
        }
        let total = u32::try_from(self.records.len()).unwrap_or(u32::MAX);
        Ok(SessionOutcome {
            score: Score::new(self.points, total),
            questions: self.questions,
            records: self.records,
        })
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("phase", &self.phase)
            .field("points", &self.points)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{QuestionDraft, QuestionKind, QuestionOrdinal};

    fn build_question(ordinal: u32, correct: &str) -> Question {
        QuestionDraft {
            ordinal: QuestionOrdinal::new(ordinal),
            text: format!("Q{ordinal}"),
            kind: QuestionKind::SingleSelect,
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_response: correct.into(),
            explanation: Some("because".into()),
        }
        .validate()
        .unwrap()
    }

    fn scored(step: AnswerStep) -> AnswerRecord {
        match step {
            AnswerStep::Scored { record, .. } => record,
            AnswerStep::Retry { .. } => panic!("expected a scored answer"),
        }
    }

    #[test]
    fn empty_session_returns_error() {
        let err = ExamSession::new(Vec::new(), Mode::Exam).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn session_scores_and_completes() {
        let mut session =
            ExamSession::new(vec![build_question(1, "1"), build_question(2, "2")], Mode::Exam)
                .unwrap();
        assert_eq!(session.phase(), SessionPhase::Presenting);

        session.begin_answer().unwrap();
        let first = scored(session.submit_answer("a").unwrap());
        assert!(first.is_correct());
        assert_eq!(session.advance().unwrap(), SessionPhase::Presenting);
        assert_eq!(session.position(), 2);

        session.begin_answer().unwrap();
        let second = scored(session.submit_answer("c").unwrap());
        assert!(!second.is_correct());
        assert_eq!(session.advance().unwrap(), SessionPhase::Complete);
        assert!(session.current_question().is_none());

        assert_eq!(session.records().len(), 2);
        assert_eq!(session.points(), 1);
        assert!(session.is_complete());

        let outcome = session.finish().unwrap();
        assert_eq!(outcome.score, Score::new(1, 2));
        assert_eq!(outcome.mistakes().count(), 1);
        assert!(!outcome.is_flawless());
    }

    #[test]
    fn three_invalid_answers_count_as_empty_and_wrong() {
        let mut session = ExamSession::new(vec![build_question(1, "1")], Mode::Exam).unwrap();
        session.begin_answer().unwrap();

        assert!(matches!(
            session.submit_answer("Z").unwrap(),
            AnswerStep::Retry { remaining: 2, .. }
        ));
        assert!(matches!(
            session.submit_answer("1").unwrap(),
            AnswerStep::Retry { remaining: 1, .. }
        ));
        match session.submit_answer("D").unwrap() {
            AnswerStep::Scored { record, rejected } => {
                assert!(record.chosen().is_empty());
                assert!(!record.is_correct());
                assert!(rejected.is_some());
            }
            AnswerStep::Retry { .. } => panic!("attempts should be exhausted"),
        }
        assert_eq!(session.points(), 0);
    }

    #[test]
    fn abandoned_answer_is_empty() {
        let mut session = ExamSession::new(vec![build_question(1, "1")], Mode::Exam).unwrap();
        session.begin_answer().unwrap();
        let record = session.abandon_answer().unwrap();
        assert!(record.chosen().is_empty());
        assert_eq!(session.phase(), SessionPhase::Scored);
    }

    #[test]
    fn phase_order_is_enforced() {
        let mut session = ExamSession::new(vec![build_question(1, "1")], Mode::Practice).unwrap();
        assert!(matches!(
            session.submit_answer("A"),
            Err(SessionError::InvalidPhase { .. })
        ));
        assert!(matches!(session.advance(), Err(SessionError::InvalidPhase { .. })));

        session.begin_answer().unwrap();
        session.submit_answer("A").unwrap();
        session.advance().unwrap();
        assert!(matches!(session.begin_answer(), Err(SessionError::Completed)));
    }

    #[test]
    fn edits_replace_explanation_in_practice_only() {
        let mut session = ExamSession::new(vec![build_question(1, "1")], Mode::Practice).unwrap();
        session.begin_answer().unwrap();
        session.submit_answer("B").unwrap();

        session.begin_edit().unwrap();
        assert_eq!(session.phase(), SessionPhase::AnnotationEdit);
        session.apply_explanation("new text").unwrap();
        session.begin_edit().unwrap();
        session.cancel_edit().unwrap();
        assert_eq!(session.phase(), SessionPhase::Scored);
        session.advance().unwrap();

        let outcome = session.finish().unwrap();
        assert_eq!(outcome.questions[0].explanation(), "new text");

        let mut exam = ExamSession::new(vec![build_question(1, "1")], Mode::Exam).unwrap();
        exam.begin_answer().unwrap();
        exam.submit_answer("A").unwrap();
        assert!(matches!(exam.begin_edit(), Err(SessionError::EditNotAllowed)));
    }

    #[test]
    fn unfinished_session_has_no_outcome() {
        let session = ExamSession::new(vec![build_question(1, "1")], Mode::Exam).unwrap();
        assert!(matches!(session.finish(), Err(SessionError::NotComplete)));
    }
}
