use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::csv_source::CsvQuestionRepository;
use crate::repository::{QuestionRepository, RunSettingsRepository, Storage};
use crate::settings_file::JsonSettingsRepository;
use crate::sqlite::{SqliteInitError, SqliteRepository};

pub const DEFAULT_SETTINGS_FILE: &str = "last_test_settings.json";

/// Where the last run configuration is remembered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsLocation {
    Json(PathBuf),
    Sqlite(String),
}

impl SettingsLocation {
    /// `sqlite:` URLs select the database backend; anything else is a JSON file path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("sqlite:") {
            Self::Sqlite(raw.to_string())
        } else {
            Self::Json(PathBuf::from(raw))
        }
    }
}

impl Default for SettingsLocation {
    fn default() -> Self {
        Self::Json(PathBuf::from(DEFAULT_SETTINGS_FILE))
    }
}

impl std::fmt::Display for SettingsLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(path) => write!(f, "{}", path.display()),
            Self::Sqlite(url) => f.write_str(url),
        }
    }
}

impl Storage {
    /// Build a `Storage` over a CSV question file and the given settings store.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a `SQLite` settings store cannot be opened
    /// or migrated.
    pub async fn open(
        questions_path: &Path,
        delimiter: u8,
        settings: &SettingsLocation,
    ) -> Result<Self, SqliteInitError> {
        let questions: Arc<dyn QuestionRepository> =
            Arc::new(CsvQuestionRepository::new(questions_path).with_delimiter(delimiter));
        let settings: Arc<dyn RunSettingsRepository> = match settings {
            SettingsLocation::Json(path) => Arc::new(JsonSettingsRepository::new(path.clone())),
            SettingsLocation::Sqlite(url) => {
                let repo = SqliteRepository::connect(url).await?;
                repo.migrate().await?;
                Arc::new(repo)
            }
        };
        Ok(Self {
            questions,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_from_location() {
        assert_eq!(
            SettingsLocation::parse("sqlite://tmp/settings.db"),
            SettingsLocation::Sqlite("sqlite://tmp/settings.db".into())
        );
        assert_eq!(
            SettingsLocation::parse(" prefs.json "),
            SettingsLocation::Json(PathBuf::from("prefs.json"))
        );
        assert_eq!(
            SettingsLocation::default(),
            SettingsLocation::Json(PathBuf::from(DEFAULT_SETTINGS_FILE))
        );
    }
}
