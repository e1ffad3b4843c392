use async_trait::async_trait;
use exam_core::model::PersistedRunSettings;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::repository::{RunSettingsRepository, StorageError};

/// Remembers the last run configuration in a pretty-printed JSON file.
///
/// A missing file simply means nothing was remembered yet.
#[derive(Debug, Clone)]
pub struct JsonSettingsRepository {
    path: PathBuf,
}

impl JsonSettingsRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RunSettingsRepository for JsonSettingsRepository {
    async fn get_settings(&self) -> Result<Option<PersistedRunSettings>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Io(err)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn save_settings(&self, settings: &PersistedRunSettings) -> Result<(), StorageError> {
        let mut json = serde_json::to_string_pretty(settings)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        json.push('\n');
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{Mode, Score, SelectionMethod};

    #[tokio::test]
    async fn missing_file_means_no_settings() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonSettingsRepository::new(dir.path().join("last_test_settings.json"));
        assert!(repo.get_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonSettingsRepository::new(dir.path().join("settings.json"));
        let settings = PersistedRunSettings {
            selection_method: SelectionMethod::Range,
            mode: Mode::Exam,
            count: 3,
            range_start: Some(2),
            seed: None,
            last_score: Some(Score::new(2, 3)),
        };

        repo.save_settings(&settings).await.unwrap();
        assert_eq!(repo.get_settings().await.unwrap(), Some(settings));

        let raw = std::fs::read_to_string(repo.path()).unwrap();
        assert!(raw.contains("\"range_start\": 2"));
        assert!(raw.contains("\"last_score\""));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonSettingsRepository::new(path).get_settings().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
