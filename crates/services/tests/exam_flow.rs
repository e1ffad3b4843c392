use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use exam_core::model::{Mode, RunConfigDraft, RunConfiguration, Score, SelectionMethod};
use exam_core::time::fixed_clock;
use services::{
    LineInput, RunSettingsService, SessionEvent, SessionPresenter, SessionRunner,
    TranscriptWriter, select,
};
use storage::csv_source::CsvQuestionRepository;
use storage::repository::{InMemoryRepository, QuestionRepository};

const HEADER: &str = "Question,Question Type (multiple-choice or multi-select),Answer Option 1,Answer Option 2,Answer Option 3,Correct Response,Explanation\n";

struct Script(VecDeque<String>);

impl Script {
    fn new<I: IntoIterator<Item = S>, S: Into<String>>(lines: I) -> Self {
        Self(lines.into_iter().map(Into::into).collect())
    }
}

impl LineInput for Script {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.0.pop_front()
    }
}

#[derive(Default)]
struct Recorder {
    lines: Vec<String>,
}

impl SessionPresenter for Recorder {
    fn show(&mut self, event: SessionEvent<'_>) {
        let line = match event {
            SessionEvent::Question { question, .. } => format!("question {}", question.ordinal()),
            SessionEvent::InvalidAnswer { remaining, .. } => format!("invalid {remaining}"),
            SessionEvent::AnswerExhausted { .. } => "exhausted".to_string(),
            SessionEvent::Feedback { record, .. } => format!("feedback {}", record.is_correct()),
            SessionEvent::AnswerSaved => "saved".to_string(),
            SessionEvent::ExplanationUpdated { .. } => "updated".to_string(),
            SessionEvent::ExplanationUpdateFailed { .. } => "update failed".to_string(),
            SessionEvent::Finished { outcome, .. } => {
                format!("finished {} mistakes", outcome.mistakes().count())
            }
            _ => return,
        };
        self.lines.push(line);
    }
}

fn write_source(dir: &Path, rows: usize) -> std::path::PathBuf {
    let mut csv = String::from(HEADER);
    for i in 1..=rows {
        csv.push_str(&format!("Question {i},multiple-choice,red,green,blue,{},Note {i}\n", (i % 3) + 1));
    }
    let path = dir.join("questions.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

/// Letter of the correct option for `Question {i}` in `write_source`.
fn answer_for(ordinal: u32) -> &'static str {
    ["A", "B", "C"][(ordinal % 3) as usize]
}

fn range(start: u32, count: u32, mode: Mode, total: usize) -> RunConfiguration {
    RunConfigDraft {
        method: SelectionMethod::Range,
        mode,
        count: Some(count),
        range_start: Some(start),
        seed: None,
    }
    .validate(total)
    .unwrap()
}

#[tokio::test]
async fn range_exam_all_correct_writes_clean_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(CsvQuestionRepository::new(write_source(dir.path(), 5)));
    let all = repo.load_questions().await.unwrap().questions;
    assert_eq!(all.len(), 5);

    let config = range(2, 3, Mode::Exam, all.len());
    let selected = select(&all, &config).unwrap();
    let answers: Vec<_> = selected.iter().map(|q| answer_for(q.ordinal().value())).collect();

    let mut presenter = Recorder::default();
    let outcome = SessionRunner::new(repo)
        .run(selected, Mode::Exam, &mut Script::new(answers), &mut presenter)
        .await
        .unwrap();

    assert_eq!(outcome.score, Score::new(3, 3));
    assert_eq!(
        presenter.lines,
        vec![
            "question 2",
            "saved",
            "question 3",
            "saved",
            "question 4",
            "saved",
            "finished 0 mistakes"
        ]
    );

    let writer = TranscriptWriter::new(dir.path()).with_clock(fixed_clock());
    let path = writer.write(&outcome, &config).unwrap();
    let date = fixed_clock().now_local().format("%y%m%d").to_string();
    assert_eq!(path, dir.path().join(format!("Result_{date}_2-4.txt")));

    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("Points: 3 of 3"));
    assert!(text.contains("Percentage: 100.00%"));
    assert!(!text.contains("(Wrong)"));
}

#[tokio::test]
async fn seeded_random_selection_repeats_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let repo = CsvQuestionRepository::new(write_source(dir.path(), 10));
    let config = RunConfigDraft {
        method: SelectionMethod::Random,
        mode: Mode::Practice,
        count: Some(2),
        range_start: None,
        seed: Some("42".into()),
    }
    .validate(10)
    .unwrap();

    let ordinals = |qs: Vec<exam_core::model::Question>| {
        qs.iter().map(|q| q.ordinal().value()).collect::<Vec<_>>()
    };
    let first = ordinals(select(&repo.load_questions().await.unwrap().questions, &config).unwrap());
    let second = ordinals(select(&repo.load_questions().await.unwrap().questions, &config).unwrap());
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn three_invalid_answers_score_an_empty_wrong_answer() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(CsvQuestionRepository::new(write_source(dir.path(), 1)));
    let all = repo.load_questions().await.unwrap().questions;

    let mut presenter = Recorder::default();
    let outcome = SessionRunner::new(repo)
        .run(all, Mode::Exam, &mut Script::new(["Z", "7", "A?"]), &mut presenter)
        .await
        .unwrap();

    assert_eq!(outcome.score, Score::new(0, 1));
    assert!(outcome.records[0].chosen().is_empty());
    assert!(!outcome.records[0].is_correct());
    assert_eq!(
        presenter.lines,
        vec!["question 1", "invalid 2", "invalid 1", "exhausted", "saved", "finished 1 mistakes"]
    );
}

#[tokio::test]
async fn practice_edit_is_written_to_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), 3);
    let repo = Arc::new(CsvQuestionRepository::new(&path));
    let all = repo.load_questions().await.unwrap().questions;
    let config = range(1, 1, Mode::Practice, all.len());
    let selected = select(&all, &config).unwrap();

    let mut presenter = Recorder::default();
    let mut input = Script::new([
        "B",
        "c",
        "Green, since 1 % 3 = 1.",
        "Really.",
        "",
        "   ",
        "end",
        "",
    ]);
    let outcome = SessionRunner::new(repo.clone())
        .run(selected, Mode::Practice, &mut input, &mut presenter)
        .await
        .unwrap();

    let expected = "Green, since 1 % 3 = 1.\nReally.";
    assert_eq!(outcome.questions[0].explanation(), expected);
    let reloaded = repo.load_questions().await.unwrap();
    assert_eq!(reloaded.questions[0].explanation(), expected);
    assert_eq!(reloaded.questions[1].explanation(), "Note 2");

    let writer = TranscriptWriter::new(dir.path()).with_clock(fixed_clock());
    let text = std::fs::read_to_string(writer.write(&outcome, &config).unwrap()).unwrap();
    assert!(text.contains(expected));
}

#[tokio::test]
async fn failed_edit_keeps_session_and_source_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.csv");
    let source = "Question,Answer Option 1,Answer Option 2,Correct Response\nWhich?,x,y,1\n";
    std::fs::write(&path, source).unwrap();
    let repo = Arc::new(CsvQuestionRepository::new(&path));
    let all = repo.load_questions().await.unwrap().questions;

    let mut presenter = Recorder::default();
    let outcome = SessionRunner::new(repo)
        .run(
            all,
            Mode::Practice,
            &mut Script::new(["A", "c", "new", "END", ""]),
            &mut presenter,
        )
        .await
        .unwrap();

    assert!(presenter.lines.contains(&"update failed".to_string()));
    assert_eq!(
        outcome.questions[0].explanation(),
        exam_core::model::DEFAULT_EXPLANATION
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), source);
    assert_eq!(outcome.score, Score::new(1, 1));
}

#[tokio::test]
async fn fresh_run_then_replay_on_same_day() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(CsvQuestionRepository::new(write_source(dir.path(), 5)));
    let settings_repo = Arc::new(InMemoryRepository::new());
    let settings = RunSettingsService::new(settings_repo);
    let writer = TranscriptWriter::new(dir.path()).with_clock(fixed_clock());
    let runner = SessionRunner::new(repo.clone());
    let all = repo.load_questions().await.unwrap().questions;

    let config = range(2, 3, Mode::Exam, all.len());
    let outcome = runner
        .run(
            select(&all, &config).unwrap(),
            Mode::Exam,
            &mut Script::new(["A", "A", "A"]),
            &mut Recorder::default(),
        )
        .await
        .unwrap();
    let fresh_path = writer.write(&outcome, &config).unwrap();
    settings.complete(config, outcome.score).await.unwrap();

    let remembered = settings.load(all.len()).await.unwrap().unwrap();
    assert_eq!(remembered.last_score(), Some(outcome.score));
    let replay = remembered.replay.unwrap();
    let replayed = select(&all, &replay).unwrap();
    assert_eq!(
        replayed.iter().map(|q| q.ordinal().value()).collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
    let outcome = runner
        .run(
            replayed,
            replay.mode(),
            &mut Script::new(["B", "C", "A"]),
            &mut Recorder::default(),
        )
        .await
        .unwrap();
    let replay_path = writer.write(&outcome, &replay).unwrap();

    let stem = fresh_path.file_stem().unwrap().to_string_lossy().into_owned();
    assert_eq!(replay_path, dir.path().join(format!("{stem}_Whd_1.txt")));
    assert_eq!(outcome.score, Score::new(0, 3));
    assert!(settings.complete(replay, outcome.score).await.unwrap().is_none());

    let remembered = settings.load(all.len()).await.unwrap().unwrap();
    assert_eq!(remembered.last_score(), Some(Score::new(1, 3)));
    assert_eq!(remembered.settings.selection_method, SelectionMethod::Range);
}
