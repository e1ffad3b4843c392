//! CSV-backed question source.
//!
//! Reads are whole-file; an explanation update rewrites the whole file through a
//! sibling temporary file that is renamed over the source.

use async_trait::async_trait;
use exam_core::model::QuestionOrdinal;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::repository::{QuestionRepository, QuestionSet, StorageError};

pub mod columns;
mod load;
mod rewrite;

pub use load::parse_questions;
pub use rewrite::replace_explanation;

#[derive(Debug, Clone)]
pub struct CsvQuestionRepository {
    path: PathBuf,
    delimiter: u8,
}

impl CsvQuestionRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_source(&self) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(&self.path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::NotFound(self.path.display().to_string())
            } else {
                StorageError::Io(err)
            }
        })
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "questions.csv".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[async_trait]
impl QuestionRepository for CsvQuestionRepository {
    async fn load_questions(&self) -> Result<QuestionSet, StorageError> {
        let data = self.read_source().await?;
        let set = parse_questions(&data, self.delimiter)?;
        info!(
            path = %self.path.display(),
            rows = set.rows_read,
            valid = set.len(),
            rejected = set.rejected.len(),
            "loaded question source"
        );
        Ok(set)
    }

    async fn update_explanation(
        &self,
        ordinal: QuestionOrdinal,
        explanation: &str,
    ) -> Result<(), StorageError> {
        let data = self.read_source().await?;
        let updated = replace_explanation(&data, self.delimiter, ordinal, explanation)?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, &updated).await?;
        if let Err(err) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::Io(err));
        }
        debug!(%ordinal, path = %self.path.display(), "rewrote explanation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = CsvQuestionRepository::new(dir.path().join("nope.csv"));
        let err = repo.load_questions().await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn temp_file_sits_next_to_source() {
        let repo = CsvQuestionRepository::new("/data/questions.csv");
        assert_eq!(repo.temp_path(), PathBuf::from("/data/.questions.csv.tmp"));
    }
}
