use exam_core::model::{Mode, PersistedRunSettings, Score, SelectionMethod};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_selection_method(s: &str) -> Result<SelectionMethod, StorageError> {
    match s.parse::<SelectionMethod>().map_err(ser)? {
        SelectionMethod::Replay => Err(StorageError::Serialization(
            "replay is not a storable selection method".into(),
        )),
        method => Ok(method),
    }
}

pub(crate) fn parse_mode(s: &str) -> Result<Mode, StorageError> {
    s.parse::<Mode>().map_err(ser)
}

pub(crate) fn map_settings_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<PersistedRunSettings, StorageError> {
    let selection_method =
        parse_selection_method(&row.try_get::<String, _>("selection_method").map_err(ser)?)?;
    let mode = parse_mode(&row.try_get::<String, _>("mode").map_err(ser)?)?;
    let count = u32_from_i64("count", row.try_get::<i64, _>("count").map_err(ser)?)?;
    let range_start = row
        .try_get::<Option<i64>, _>("range_start")
        .map_err(ser)?
        .map(|v| u32_from_i64("range_start", v))
        .transpose()?;
    let seed: Option<String> = row.try_get("seed").map_err(ser)?;

    let last_points = row.try_get::<Option<i64>, _>("last_points").map_err(ser)?;
    let last_total = row.try_get::<Option<i64>, _>("last_total").map_err(ser)?;
    let last_score = match (last_points, last_total) {
        (Some(points), Some(total)) => Some(Score::new(
            u32_from_i64("last_points", points)?,
            u32_from_i64("last_total", total)?,
        )),
        _ => None,
    };

    Ok(PersistedRunSettings {
        selection_method,
        mode,
        count,
        range_start,
        seed,
        last_score,
    })
}
