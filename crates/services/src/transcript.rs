//! Plain-text transcripts of completed runs.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use tracing::info;

use exam_core::model::{LetterSet, RunConfiguration, Selection};

use crate::Clock;
use crate::error::TranscriptError;
use crate::sessions::SessionOutcome;

const RULE: &str = "==================================================";
const ENTRY_RULE: &str = "--------------------------------------------------";
const MAX_SUFFIX: u32 = 10_000;

/// Writes one transcript per run into a results directory, never overwriting.
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    results_dir: PathBuf,
    clock: Clock,
}

impl TranscriptWriter {
    #[must_use]
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            clock: Clock::default_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Name stem for a run, e.g. `Result_240131_2-4` or `Result_240131_Random_42`.
    #[must_use]
    pub fn basename(&self, config: &RunConfiguration) -> String {
        let date = self.clock.now_local().format("%y%m%d");
        match config.selection() {
            Selection::Range { start } => {
                let end = config.range_end().unwrap_or(*start);
                format!("Result_{date}_{start}-{end}")
            }
            Selection::Random { seed: Some(seed) } => {
                format!("Result_{date}_Random_{}", file_safe(seed.as_str()))
            }
            Selection::Random { seed: None } => format!("Result_{date}_Random"),
        }
    }

    /// Write the transcript and return its path.
    ///
    /// A fresh run uses `<basename>.txt`, then `<basename>_2.txt` and so on if
    /// taken. A replay uses the first free `<basename>_Whd_<i>.txt`, from 1.
    ///
    /// # Errors
    ///
    /// Returns `TranscriptError::Io` if the file cannot be created or written.
    pub fn write(
        &self,
        outcome: &SessionOutcome,
        config: &RunConfiguration,
    ) -> Result<PathBuf, TranscriptError> {
        let basename = self.basename(config);
        let body = self.render(outcome, config);

        for candidate in candidate_names(&basename, config.is_replay()) {
            let path = self.results_dir.join(candidate);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(TranscriptError::Io(err)),
            };
            file.write_all(body.as_bytes())?;
            file.flush()?;
            info!(path = %path.display(), "transcript written");
            return Ok(path);
        }

        Err(TranscriptError::NamesExhausted { basename })
    }

    /// Full transcript text.
    #[must_use]
    pub fn render(&self, outcome: &SessionOutcome, config: &RunConfiguration) -> String {
        let mut out = String::new();
        let now = self.clock.now_local();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "{RULE}\n### Exam Transcript ###");
        let _ = writeln!(out, "Date: {}", now.format("%d.%m.%Y, %H:%M:%S"));
        let _ = writeln!(out, "Mode: {}", config.mode().label());
        let _ = writeln!(
            out,
            "Selection: {} ({} questions)",
            selection_label(config),
            config.count()
        );
        if let Some(seed) = config.seed() {
            let _ = writeln!(out, "Random Seed: {seed}");
        }

        let score = outcome.score;
        let _ = writeln!(out, "\n--- Final Result ---");
        let _ = writeln!(out, "Points: {} of {}", score.points, score.total);
        let _ = writeln!(out, "Percentage: {:.2}%", score.percentage());
        let _ = writeln!(out, "{RULE}\n");

        for (question, record) in outcome.entries() {
            let status = if record.is_correct() { "Correct" } else { "Wrong" };
            let _ = writeln!(out, "--- Question No. {} ({status}) ---", question.ordinal());
            let _ = writeln!(out, "Question: {}", question.text());
            let _ = writeln!(out, "Your answer:     {}", letters_or_none(record.chosen()));
            let _ = writeln!(out, "Correct answer:  {}\n", letters_or_none(record.correct()));
            let _ = writeln!(out, "Explanation:\n{}\n{ENTRY_RULE}\n", question.explanation());
        }

        out
    }
}

fn selection_label(config: &RunConfiguration) -> String {
    let method = match config.selection() {
        Selection::Range { start } => {
            format!("Range {start}-{}", config.range_end().unwrap_or(*start))
        }
        Selection::Random { .. } => "Random".to_string(),
    };
    if config.is_replay() {
        format!("Replay of {method}")
    } else {
        method
    }
}

fn letters_or_none(letters: &LetterSet) -> String {
    if letters.is_empty() {
        "(none)".to_string()
    } else {
        letters.to_string()
    }
}

/// Seeds are free text; anything but letters, digits, `-` and `_` becomes `_` so
/// the name stays a single path component inside the results directory.
fn file_safe(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn candidate_names(basename: &str, replay: bool) -> impl Iterator<Item = String> + '_ {
    let first = (!replay).then(|| format!("{basename}.txt"));
    let start = if replay { 1 } else { 2 };
    first.into_iter().chain((start..=MAX_SUFFIX).map(move |i| {
        if replay {
            format!("{basename}_Whd_{i}.txt")
        } else {
            format!("{basename}_{i}.txt")
        }
    }))
}
