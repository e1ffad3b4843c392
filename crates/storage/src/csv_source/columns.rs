use csv::StringRecord;
use exam_core::model::MAX_OPTIONS;

pub const QUESTION: &str = "Question";
pub const QUESTION_TYPE: &str = "Question Type (multiple-choice or multi-select)";
pub const CORRECT_RESPONSE: &str = "Correct Response";
pub const EXPLANATION: &str = "Explanation";

#[must_use]
pub fn answer_option(n: usize) -> String {
    format!("Answer Option {n}")
}

/// Header positions of the columns the loader understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub question: Option<usize>,
    pub question_type: Option<usize>,
    pub options: Vec<Option<usize>>,
    pub correct_response: Option<usize>,
    pub explanation: Option<usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Self {
        Self {
            question: find(headers, QUESTION),
            question_type: find(headers, QUESTION_TYPE),
            options: (1..=MAX_OPTIONS)
                .map(|n| find(headers, &answer_option(n)))
                .collect(),
            correct_response: find(headers, CORRECT_RESPONSE),
            explanation: find(headers, EXPLANATION),
        }
    }
}

/// Position of `name`, ignoring surrounding whitespace and a leading byte-order mark.
pub(crate) fn find(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
}

/// Field at `column`, or `None` if the column is unknown or the row is short.
pub(crate) fn field(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column.and_then(|idx| record.get(idx))
}
