//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{AnswerError, LetterError};
use storage::repository::StorageError;

/// Errors emitted by the question selector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("selection of {count} questions from position {start} exceeds the {available} available")]
    OutOfBounds {
        start: usize,
        count: usize,
        available: usize,
    },
}

/// Errors emitted by exam sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("session is not complete yet")]
    NotComplete,
    #[error("cannot {action} while the session is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },
    #[error("explanations can only be edited in practice mode")]
    EditNotAllowed,
    #[error(transparent)]
    Letter(#[from] LetterError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TranscriptWriter`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranscriptError {
    #[error("no free transcript name left for {basename}")]
    NamesExhausted { basename: String },
    #[error("failed to write transcript: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by `RunSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunSettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
