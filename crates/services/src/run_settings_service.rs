use std::sync::Arc;

use tracing::{debug, info, warn};

use exam_core::model::{PersistedRunSettings, RunConfigError, RunConfiguration, Score};
use storage::repository::{RunSettingsRepository, StorageError};

use crate::error::RunSettingsServiceError;

/// The configuration remembered from the previous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberedRun {
    pub settings: PersistedRunSettings,
    /// The settings re-validated against the current question count, ready to
    /// replay.
    pub replay: Result<RunConfiguration, RunConfigError>,
}

impl RememberedRun {
    #[must_use]
    pub fn last_score(&self) -> Option<Score> {
        self.settings.last_score
    }
}

/// Load and save phases for the remembered run configuration.
#[derive(Clone)]
pub struct RunSettingsService {
    repo: Arc<dyn RunSettingsRepository>,
}

impl RunSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn RunSettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load the remembered configuration, checked against `total_questions`.
    ///
    /// Unreadable stored settings are logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `RunSettingsServiceError` if the store itself cannot be reached.
    pub async fn load(
        &self,
        total_questions: usize,
    ) -> Result<Option<RememberedRun>, RunSettingsServiceError> {
        let settings = match self.repo.get_settings().await {
            Ok(settings) => settings,
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "ignoring unreadable run settings");
                None
            }
            Err(err) => return Err(err.into()),
        };

        Ok(settings.map(|settings| {
            let replay = settings
                .clone()
                .into_config(total_questions)
                .map(RunConfiguration::into_replay);
            if let Err(error) = &replay {
                warn!(%error, "remembered run no longer fits the question source");
            }
            RememberedRun { settings, replay }
        }))
    }

    /// Record the score of a finished run and persist its configuration.
    ///
    /// A replay leaves the remembered run and its score untouched and returns
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `RunSettingsServiceError` if persistence fails.
    pub async fn complete(
        &self,
        config: RunConfiguration,
        score: Score,
    ) -> Result<Option<RunConfiguration>, RunSettingsServiceError> {
        if config.is_replay() {
            debug!(%score, "replay finished; remembered run kept");
            return Ok(None);
        }
        let config = config.completed(score);
        self.repo.save_settings(&config.to_persisted()).await?;
        info!(method = %config.selection_method(), %score, "run settings saved");
        Ok(Some(config))
    }
}
