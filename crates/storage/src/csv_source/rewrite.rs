use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use exam_core::model::QuestionOrdinal;

use super::columns;
use crate::repository::StorageError;

/// Return a copy of the source with one explanation replaced.
///
/// The header stays row 0, so the data row for `ordinal` is record `ordinal`.
/// Every other record is written back field-for-field with the same delimiter and
/// line terminator; short rows are padded up to the explanation column.
///
/// # Errors
///
/// Returns `StorageError::MissingColumn` if the header has no explanation column,
/// `StorageError::NotFound` if no row matches `ordinal`.
pub fn replace_explanation(
    data: &[u8],
    delimiter: u8,
    ordinal: QuestionOrdinal,
    explanation: &str,
) -> Result<Vec<u8>, StorageError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records = reader
        .records()
        .collect::<Result<Vec<StringRecord>, _>>()?;

    let header = records
        .first()
        .ok_or_else(|| StorageError::MissingColumn(columns::EXPLANATION.to_string()))?;
    let column = columns::find(header, columns::EXPLANATION)
        .ok_or_else(|| StorageError::MissingColumn(columns::EXPLANATION.to_string()))?;

    let row = usize::try_from(ordinal.value()).unwrap_or(usize::MAX);
    let record = records
        .get_mut(row)
        .filter(|_| row > 0)
        .ok_or_else(|| StorageError::NotFound(format!("question row {ordinal}")))?;

    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    if fields.len() <= column {
        fields.resize(column + 1, String::new());
    }
    fields[column] = explanation.to_string();
    *record = StringRecord::from(fields);

    let terminator = if data.windows(2).any(|w| w == b"\r\n") {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    };
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(terminator)
        .flexible(true)
        .from_writer(Vec::with_capacity(data.len() + explanation.len()));
    for record in &records {
        writer.write_record(record)?;
    }
    writer
        .into_inner()
        .map_err(|err| StorageError::Io(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(data: &[u8]) -> Vec<Vec<String>> {
        ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data)
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    const SOURCE: &str = "Question,Answer Option 1,Correct Response,Explanation\n\
                          First,\"a, with comma\",1,old one\n\
                          Second,b,1,old two\n";

    #[test]
    fn replaces_only_the_target_explanation() {
        let out = replace_explanation(
            SOURCE.as_bytes(),
            b',',
            QuestionOrdinal::new(2),
            "line one\nline \"two\"",
        )
        .unwrap();

        let before = records(SOURCE.as_bytes());
        let after = records(&out);
        assert_eq!(after.len(), before.len());
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2][..3], before[2][..3]);
        assert_eq!(after[2][3], "line one\nline \"two\"");
    }

    #[test]
    fn untouched_rows_keep_their_quoting() {
        let out = replace_explanation(SOURCE.as_bytes(), b',', QuestionOrdinal::new(2), "new")
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("First,\"a, with comma\",1,old one\n"));
        assert!(text.ends_with("Second,b,1,new\n"));
    }

    #[test]
    fn keeps_crlf_line_endings() {
        let source = SOURCE.replace('\n', "\r\n");
        let out = replace_explanation(source.as_bytes(), b',', QuestionOrdinal::new(1), "x")
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Question,Answer Option 1,Correct Response,Explanation\r\n"));
        assert!(text.ends_with("old two\r\n"));
    }

    #[test]
    fn pads_short_rows() {
        let source = "Question,Answer Option 1,Correct Response,Explanation\nShort,a,1\n";
        let out = replace_explanation(source.as_bytes(), b',', QuestionOrdinal::new(1), "added")
            .unwrap();
        assert_eq!(records(&out)[1], vec!["Short", "a", "1", "added"]);
    }

    #[test]
    fn missing_explanation_column_fails() {
        let source = "Question,Answer Option 1,Correct Response\nQ,a,1\n";
        let err = replace_explanation(source.as_bytes(), b',', QuestionOrdinal::new(1), "x")
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingColumn(_)));
    }

    #[test]
    fn unknown_row_fails() {
        let err = replace_explanation(SOURCE.as_bytes(), b',', QuestionOrdinal::new(3), "x")
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        let err = replace_explanation(SOURCE.as_bytes(), b',', QuestionOrdinal::new(0), "x")
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
