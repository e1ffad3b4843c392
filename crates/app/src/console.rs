use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

use exam_core::model::{LetterSet, Mode, Question, QuestionKind};
use services::{SessionEvent, SessionOutcome, SessionPresenter};
use storage::repository::RowRejection;

const RULE: &str = "==================================================";
const THIN_RULE: &str = "--------------------";
const BANNER: &str = "##################################################";

/// ANSI styling, switched off for pipes and when `NO_COLOR` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    enabled: bool,
}

impl Style {
    #[must_use]
    pub fn detect() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    #[cfg(test)]
    #[must_use]
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn wrap(self, code: &str, text: impl Display) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn bold(self, text: impl Display) -> String {
        self.wrap("1", text)
    }

    pub fn italic(self, text: impl Display) -> String {
        self.wrap("3", text)
    }
}

/// Terminal rendering for menus and session events.
pub struct Console<W: Write> {
    out: W,
    style: Style,
}

impl Console<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout(), Style::detect())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, style: Style) -> Self {
        Self { out, style }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write one line; a closed terminal is not worth aborting the run for.
    pub fn line(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    pub fn welcome(&mut self) {
        self.line("--- Welcome to the exam simulator ---");
    }

    pub fn rejected_row(&mut self, rejection: &RowRejection) {
        self.line(format!(
            "WARNING: row {}: question '{}' skipped ({})",
            rejection.row, rejection.excerpt, rejection.reason
        ));
    }

    pub fn transcript_saved(&mut self, path: &Path) {
        self.line(format!(
            "\nA detailed transcript was saved to '{}'.",
            path.display()
        ));
    }

    fn options(&mut self, question: &Question) {
        match question.lettered_options() {
            Ok(options) => {
                for (letter, option) in options {
                    self.line(format!("  {letter}) {option}"));
                }
            }
            Err(err) => self.line(format!("  (options unavailable: {err})")),
        }
    }

    fn question(&mut self, position: usize, total: usize, question: &Question) {
        let heading = format!(
            "Question {position} of {total} (original no. {}):",
            question.ordinal()
        );
        self.line(format!("\n{RULE}\n{}", self.style.bold(heading)));
        self.line(question.text());
        if question.kind() == QuestionKind::MultiSelect {
            self.line("(select all that apply)");
        }
        self.line(THIN_RULE);
        self.options(question);
        self.line(THIN_RULE);
    }

    fn explanation(&mut self, question: &Question) {
        let text = self.style.italic(question.explanation());
        self.line(format!("\n--- Explanation ---\n{text}"));
    }

    fn finished(&mut self, mode: Mode, outcome: &SessionOutcome) {
        let score = outcome.score;
        self.line(format!("\n{BANNER}\n### Exam finished! ###"));
        self.line(format!("Your result: {} of {} points.", score.points, score.total));
        self.line(format!(
            "That is a success rate of {:.2}%.\n{BANNER}",
            score.percentage()
        ));

        if mode != Mode::Exam {
            return;
        }
        if outcome.is_flawless() {
            self.line("\nCongratulations! Every question was answered correctly!");
            return;
        }

        self.line("\n\n--- Review of incorrect answers ---");
        for (question, record) in outcome.mistakes() {
            let heading = self.style.bold(format!("QUESTION (No. {}):", question.ordinal()));
            self.line(format!("\n{RULE}\n{heading} {}", question.text()));
            self.line(THIN_RULE);
            self.options(question);
            self.line(THIN_RULE);
            let chosen = self.style.bold(letters(record.chosen()));
            let correct = self.style.bold(letters(record.correct()));
            self.line(format!("  Your answer:     {chosen}"));
            self.line(format!("  Correct answer:  {correct}"));
            let label = self.style.bold("Explanation:");
            let text = self.style.italic(question.explanation());
            self.line(format!("\n  {label}\n{text}"));
        }
    }
}

fn letters(set: &LetterSet) -> String {
    if set.is_empty() {
        "(none)".to_string()
    } else {
        set.to_string()
    }
}

impl<W: Write> SessionPresenter for Console<W> {
    fn show(&mut self, event: SessionEvent<'_>) {
        match event {
            SessionEvent::Started { mode, total } => self.line(format!(
                "\n--- {} mode starts! There are {total} questions. ---",
                mode.label()
            )),
            SessionEvent::Question {
                position,
                total,
                question,
            } => self.question(position, total, question),
            SessionEvent::InvalidAnswer { error, remaining } => self.line(format!(
                "!! Invalid input: {error}. Use letters and commas only. {remaining} attempt(s) left."
            )),
            SessionEvent::AnswerExhausted { error: Some(_) } => {
                self.line("!! Too many invalid inputs. The answer counts as wrong.");
            }
            SessionEvent::AnswerExhausted { error: None } => {
                self.line("!! No input. The answer counts as wrong.");
            }
            SessionEvent::Feedback { question, record } => {
                if record.is_correct() {
                    self.line("Correct!");
                } else {
                    let correct = self.style.bold(letters(record.correct()));
                    self.line(format!("Wrong. Correct answer: {correct}"));
                }
                self.explanation(question);
            }
            SessionEvent::AnswerSaved => self.line("Answer saved."),
            SessionEvent::ExplanationEntry => {
                self.line("Enter the new explanation (several lines are fine).");
                self.line("Type END on a line of its own and press Enter to finish.");
            }
            SessionEvent::ExplanationUpdated { question } => {
                self.line("\n>> Explanation updated in the question file.");
                self.explanation(question);
            }
            SessionEvent::ExplanationUpdateFailed { ordinal, error } => self.line(format!(
                "\n>> ERROR: could not update the explanation of question {ordinal}: {error}"
            )),
            SessionEvent::Finished { mode, outcome } => self.finished(mode, outcome),
        }
    }
}
