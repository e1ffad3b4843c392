use csv::ReaderBuilder;
use exam_core::model::{QuestionDraft, QuestionKind, QuestionOrdinal};
use tracing::debug;

use super::columns::{self, ColumnMap};
use crate::repository::{QuestionSet, RowRejection, StorageError};

const EXCERPT_CHARS: usize = 40;

/// Parse a question source held in memory.
///
/// Rows with an empty question, or a repeated header row, are skipped silently.
/// Rows failing validation are collected in `QuestionSet::rejected`.
///
/// # Errors
///
/// Returns `StorageError::MissingColumn` if there is no `Question` column, or
/// `StorageError::Csv` if the data is not valid CSV.
pub fn parse_questions(data: &[u8], delimiter: u8) -> Result<QuestionSet, StorageError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let map = ColumnMap::from_headers(&headers);
    if map.question.is_none() {
        return Err(StorageError::MissingColumn(columns::QUESTION.to_string()));
    }

    let mut set = QuestionSet::default();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        set.rows_read += 1;

        let ordinal = QuestionOrdinal::new(u32::try_from(idx + 1).unwrap_or(u32::MAX));
        let text = columns::field(&record, map.question).unwrap_or_default().trim();
        if text.is_empty() || text == columns::QUESTION {
            continue;
        }

        let options: Vec<String> = map
            .options
            .iter()
            .map(|&column| columns::field(&record, column).map(str::trim).unwrap_or_default())
            .take_while(|option| !option.is_empty())
            .map(str::to_string)
            .collect();

        let draft = QuestionDraft {
            ordinal,
            text: text.to_string(),
            kind: QuestionKind::from_source(
                columns::field(&record, map.question_type).unwrap_or_default(),
            ),
            options,
            correct_response: columns::field(&record, map.correct_response)
                .unwrap_or_default()
                .to_string(),
            explanation: columns::field(&record, map.explanation).map(str::to_string),
        };

        match draft.validate() {
            Ok(question) => set.questions.push(question),
            Err(reason) => {
                let rejection = RowRejection {
                    ordinal,
                    row: idx + 2,
                    excerpt: text.chars().take(EXCERPT_CHARS).collect(),
                    reason,
                };
                debug!(
                    row = rejection.row,
                    reason = %rejection.reason,
                    "skipping question row"
                );
                set.rejected.push(rejection);
            }
        }
    }

    Ok(set)
}
