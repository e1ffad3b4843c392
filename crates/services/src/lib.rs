#![forbid(unsafe_code)]

pub mod error;
pub mod run_settings_service;
pub mod sessions;
pub mod transcript;

pub use exam_core::Clock;
pub use sessions as session;

pub use error::{RunSettingsServiceError, SelectionError, SessionError, TranscriptError};
pub use run_settings_service::{RememberedRun, RunSettingsService};
pub use sessions::{
    ExamSession, LineInput, SessionEvent, SessionOutcome, SessionPhase, SessionPresenter,
    SessionRunner, select,
};
pub use transcript::TranscriptWriter;
