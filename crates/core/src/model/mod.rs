mod answer;
mod ids;
mod letters;
mod question;
mod run_config;
mod score;

pub use ids::{ParseOrdinalError, QuestionOrdinal};
pub use letters::{LETTER_COUNT, LetterError, LetterSet, OptionLetter};

pub use answer::{AnswerAttempts, AnswerError, AnswerRecord, AttemptOutcome, MAX_ANSWER_ATTEMPTS};
pub use question::{
    DEFAULT_EXPLANATION, MAX_OPTIONS, Question, QuestionDraft, QuestionError, QuestionKind,
};
pub use run_config::{
    Mode, PersistedRunSettings, RunConfigDraft, RunConfigError, RunConfiguration, RunOrigin, Seed,
    Selection, SelectionMethod, max_range_start,
};
pub use score::Score;
