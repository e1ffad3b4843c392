use std::sync::Arc;

use tracing::{info, warn};

use exam_core::model::{
    AnswerRecord, LetterError, Mode, Question, QuestionKind, QuestionOrdinal,
};
use storage::repository::{QuestionRepository, StorageError};

use super::service::{AnswerStep, ExamSession, SessionOutcome};
use crate::error::SessionError;

/// Line that ends a multi-line explanation, compared case-insensitively.
pub const END_OF_EXPLANATION: &str = "END";

const ANSWER_PROMPT: &str = "Your answer: ";
const MULTI_ANSWER_PROMPT: &str = "Your answer (several letters, e.g. A,C): ";
const EDIT_PROMPT: &str = "Press 'c' to change the explanation, or Enter to continue: ";

//
// ─── COLLABORATORS ─────────────────────────────────────────────────────────────
//

/// Blocking source of user input lines.
pub trait LineInput {
    /// Show `prompt` and read one line without its terminator.
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Something the session wants the user to see.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    Started {
        mode: Mode,
        total: usize,
    },
    Question {
        position: usize,
        total: usize,
        question: &'a Question,
    },
    InvalidAnswer {
        error: &'a LetterError,
        remaining: u8,
    },
    /// The answer defaulted to an empty selection. `error` is `None` when
    /// input ended instead of the attempts running out.
    AnswerExhausted {
        error: Option<&'a LetterError>,
    },
    /// Practice mode: correctness plus explanation.
    Feedback {
        question: &'a Question,
        record: &'a AnswerRecord,
    },
    /// Exam mode acknowledgement.
    AnswerSaved,
    ExplanationEntry,
    ExplanationUpdated {
        question: &'a Question,
    },
    ExplanationUpdateFailed {
        ordinal: QuestionOrdinal,
        error: &'a StorageError,
    },
    Finished {
        mode: Mode,
        outcome: &'a SessionOutcome,
    },
}

pub trait SessionPresenter {
    fn show(&mut self, event: SessionEvent<'_>);
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// Drives an `ExamSession` with user input and writes explanation edits back
/// to the question source.
#[derive(Clone)]
pub struct SessionRunner {
    questions: Arc<dyn QuestionRepository>,
}

impl SessionRunner {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// Run a whole session over the selected questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `selected` is empty. Failed explanation
    /// updates are reported to the presenter and do not end the session.
    pub async fn run(
        &self,
        selected: Vec<Question>,
        mode: Mode,
        input: &mut dyn LineInput,
        presenter: &mut dyn SessionPresenter,
    ) -> Result<SessionOutcome, SessionError> {
        let mut session = ExamSession::new(selected, mode)?;
        let total = session.total_questions();
        info!(%mode, total, "session started");
        presenter.show(SessionEvent::Started { mode, total });

        while !session.is_complete() {
            let position = session.position();
            let question = session.begin_answer()?;
            presenter.show(SessionEvent::Question {
                position,
                total,
                question,
            });
            let prompt = answer_prompt(question);

            let record = loop {
                let Some(line) = input.read_line(prompt) else {
                    let record = session.abandon_answer()?;
                    presenter.show(SessionEvent::AnswerExhausted { error: None });
                    break record;
                };
                match session.submit_answer(&line)? {
                    AnswerStep::Retry { remaining, error } => {
                        presenter.show(SessionEvent::InvalidAnswer {
                            error: &error,
                            remaining,
                        });
                    }
                    AnswerStep::Scored { record, rejected } => {
                        if let Some(error) = &rejected {
                            presenter.show(SessionEvent::AnswerExhausted { error: Some(error) });
                        }
                        break record;
                    }
                }
            };

            match mode {
                Mode::Practice => {
                    let question = session.current_question().ok_or(SessionError::Completed)?;
                    presenter.show(SessionEvent::Feedback {
                        question,
                        record: &record,
                    });
                    self.annotate(&mut session, input, presenter).await?;
                }
                Mode::Exam => presenter.show(SessionEvent::AnswerSaved),
            }

            session.advance()?;
        }

        let outcome = session.finish()?;
        info!(
            points = outcome.score.points,
            total = outcome.score.total,
            "session complete"
        );
        presenter.show(SessionEvent::Finished {
            mode,
            outcome: &outcome,
        });
        Ok(outcome)
    }

    /// Offer explanation edits for the question just scored until the user
    /// continues.
    async fn annotate(
        &self,
        session: &mut ExamSession,
        input: &mut dyn LineInput,
        presenter: &mut dyn SessionPresenter,
    ) -> Result<(), SessionError> {
        loop {
            let Some(action) = input.read_line(EDIT_PROMPT) else {
                return Ok(());
            };
            let action = action.trim();
            if action.is_empty() {
                return Ok(());
            }
            if !action.eq_ignore_ascii_case("c") {
                continue;
            }

            let ordinal = session.begin_edit()?.ordinal();
            presenter.show(SessionEvent::ExplanationEntry);
            let explanation = read_explanation(input);

            match self.questions.update_explanation(ordinal, &explanation).await {
                Ok(()) => {
                    let question = session.apply_explanation(explanation)?;
                    info!(%ordinal, "explanation updated");
                    presenter.show(SessionEvent::ExplanationUpdated { question });
                }
                Err(error) => {
                    warn!(%ordinal, %error, "explanation update failed");
                    session.cancel_edit()?;
                    presenter.show(SessionEvent::ExplanationUpdateFailed {
                        ordinal,
                        error: &error,
                    });
                }
            }
        }
    }
}

fn answer_prompt(question: &Question) -> &'static str {
    match question.kind() {
        QuestionKind::SingleSelect => ANSWER_PROMPT,
        QuestionKind::MultiSelect => MULTI_ANSWER_PROMPT,
    }
}

/// Collect lines up to the `END` line. End of input keeps what was read so far.
///
/// The text is trimmed the same way the loader trims a stored explanation, so
/// the session copy matches what the next load returns.
pub fn read_explanation(input: &mut dyn LineInput) -> String {
    let mut lines = Vec::new();
    while let Some(line) = input.read_line("") {
        if line.trim().eq_ignore_ascii_case(END_OF_EXPLANATION) {
            break;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}
