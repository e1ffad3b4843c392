use async_trait::async_trait;
use exam_core::model::{PersistedRunSettings, Question, QuestionError, QuestionOrdinal};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("column '{0}' not found in question source")]
    MissingColumn(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── QUESTION SOURCE ──────────────────────────────────────────────────────────
//

/// A source row that did not become a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub ordinal: QuestionOrdinal,
    /// Row number as seen in a spreadsheet (the header is row 1).
    pub row: usize,
    /// First characters of the question text.
    pub excerpt: String,
    pub reason: QuestionError,
}

/// Everything a load produced: valid questions plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
    /// Data rows read, including skipped and rejected ones.
    pub rows_read: usize,
    pub rejected: Vec<RowRejection>,
}

impl QuestionSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Load every valid question in source order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the source is missing, or other
    /// storage errors if it cannot be read.
    async fn load_questions(&self) -> Result<QuestionSet, StorageError>;

    /// Replace the explanation of the question at `ordinal`, leaving everything
    /// else in the source untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MissingColumn` if the source has no explanation
    /// column, `StorageError::NotFound` if the row does not exist.
    async fn update_explanation(
        &self,
        ordinal: QuestionOrdinal,
        explanation: &str,
    ) -> Result<(), StorageError>;
}

//
// ─── RUN SETTINGS ─────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait RunSettingsRepository: Send + Sync {
    /// Fetch the remembered run configuration, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if stored settings exist but cannot be read.
    async fn get_settings(&self) -> Result<Option<PersistedRunSettings>, StorageError>;

    /// Persist the run configuration, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &PersistedRunSettings) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
    settings: Arc<Mutex<Option<PersistedRunSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
            settings: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn load_questions(&self) -> Result<QuestionSet, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(QuestionSet {
            questions: guard.clone(),
            rows_read: guard.len(),
            rejected: Vec::new(),
        })
    }

    async fn update_explanation(
        &self,
        ordinal: QuestionOrdinal,
        explanation: &str,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let question = guard
            .iter_mut()
            .find(|q| q.ordinal() == ordinal)
            .ok_or_else(|| StorageError::NotFound(format!("question {ordinal}")))?;
        question.set_explanation(explanation);
        Ok(())
    }
}

#[async_trait]
impl RunSettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<PersistedRunSettings>, StorageError> {
        let guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_settings(&self, settings: &PersistedRunSettings) -> Result<(), StorageError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

/// Aggregates the question source and settings store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub settings: Arc<dyn RunSettingsRepository>,
}
