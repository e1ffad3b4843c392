mod plan;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{SelectionError, SessionError};
pub use plan::{select, shuffled_indices};
pub use service::{AnswerStep, ExamSession, SessionOutcome, SessionPhase};
pub use workflow::{
    END_OF_EXPLANATION, LineInput, SessionEvent, SessionPresenter, SessionRunner,
    read_explanation,
};
