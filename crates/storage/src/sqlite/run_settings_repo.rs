use async_trait::async_trait;
use chrono::Utc;
use exam_core::model::PersistedRunSettings;

use super::{SqliteRepository, mapping::map_settings_row};
use crate::repository::{RunSettingsRepository, StorageError};

#[async_trait]
impl RunSettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<PersistedRunSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                selection_method,
                mode,
                count,
                range_start,
                seed,
                last_points,
                last_total
            FROM run_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_settings_row).transpose()
    }

    async fn save_settings(&self, settings: &PersistedRunSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO run_settings (
                id,
                selection_method,
                mode,
                count,
                range_start,
                seed,
                last_points,
                last_total,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                selection_method = excluded.selection_method,
                mode = excluded.mode,
                count = excluded.count,
                range_start = excluded.range_start,
                seed = excluded.seed,
                last_points = excluded.last_points,
                last_total = excluded.last_total,
                updated_at = excluded.updated_at
            ",
        )
        .bind(1_i64)
        .bind(settings.selection_method.as_str())
        .bind(settings.mode.as_str())
        .bind(i64::from(settings.count))
        .bind(settings.range_start.map(i64::from))
        .bind(settings.seed.as_deref())
        .bind(settings.last_score.map(|s| i64::from(s.points)))
        .bind(settings.last_score.map(|s| i64::from(s.total)))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
