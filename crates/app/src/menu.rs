use std::fmt;
use std::io::Write;

use exam_core::model::{
    Mode, RunConfigDraft, RunConfigError, RunConfiguration, SelectionMethod, max_range_start,
};
use services::{LineInput, RememberedRun};

use crate::console::Console;

const METHOD_PROMPT: &str =
    "\nHow should the questions be selected?\n  1) Range (consecutive questions)\n  2) Random\nChoice: ";
const MODE_PROMPT: &str = "\nChoose a mode:\n  1) Practice (feedback after every question)\n  2) Exam (evaluation at the end)\nChoice: ";
const SEED_PROMPT: &str = "Enter a seed (number or text, Enter for none): ";
const INVALID_CHOICE: &str = "Invalid choice.";

#[derive(Debug)]
pub enum MenuError {
    /// Input ended at a menu prompt.
    Aborted,
    Config(RunConfigError),
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuError::Aborted => write!(f, "input ended before the exam was configured"),
            MenuError::Config(err) => write!(f, "invalid exam settings: {err}"),
        }
    }
}

impl std::error::Error for MenuError {}

/// Ask until `parse` accepts the trimmed answer; its `Err` text is shown before
/// asking again.
fn ask<T, W: Write>(
    input: &mut dyn LineInput,
    console: &mut Console<W>,
    prompt: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T, MenuError> {
    loop {
        let line = input.read_line(prompt).ok_or(MenuError::Aborted)?;
        match parse(line.trim()) {
            Ok(value) => return Ok(value),
            Err(message) => console.line(message),
        }
    }
}

/// Offer the remembered run first, then fall back to fresh prompts.
///
/// # Errors
///
/// Returns `MenuError::Aborted` if input ends at any prompt.
pub fn choose_configuration<W: Write>(
    input: &mut dyn LineInput,
    console: &mut Console<W>,
    total: usize,
    remembered: Option<&RememberedRun>,
) -> Result<RunConfiguration, MenuError> {
    if let Some(remembered) = remembered {
        let score_text = remembered
            .last_score()
            .map(|score| format!(" (your last result: {score})"))
            .unwrap_or_default();
        let prompt = format!("Repeat the last exam?{score_text} (y/n): ");
        let repeat = ask(input, console, &prompt, |answer| {
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => Ok(true),
                "n" | "no" => Ok(false),
                _ => Err("Please answer y or n.".to_string()),
            }
        })?;

        if repeat {
            match &remembered.replay {
                Ok(config) => return Ok(config.clone()),
                Err(err) => console.line(format!(
                    "The last exam cannot be repeated ({err}). Please choose new settings."
                )),
            }
        }
    }

    prompt_configuration(input, console, total)
}

/// Prompt for a fresh run configuration.
///
/// # Errors
///
/// Returns `MenuError::Aborted` if input ends at any prompt.
pub fn prompt_configuration<W: Write>(
    input: &mut dyn LineInput,
    console: &mut Console<W>,
    total: usize,
) -> Result<RunConfiguration, MenuError> {
    let total_u32 = u32::try_from(total).unwrap_or(u32::MAX);

    let method = ask(input, console, METHOD_PROMPT, |choice| match choice {
        "1" => Ok(SelectionMethod::Range),
        "2" => Ok(SelectionMethod::Random),
        _ => Err(INVALID_CHOICE.to_string()),
    })?;

    let mode = ask(input, console, MODE_PROMPT, |choice| match choice {
        "1" => Ok(Mode::Practice),
        "2" => Ok(Mode::Exam),
        _ => Err(INVALID_CHOICE.to_string()),
    })?;

    let count_prompt = format!("\nHow many questions? (Enter for all {total}): ");
    let count = ask(input, console, &count_prompt, |raw| {
        if raw.is_empty() {
            return Ok(total_u32);
        }
        let count: u32 = raw.parse().map_err(|_| "Invalid input.".to_string())?;
        if (1..=total_u32).contains(&count) {
            Ok(count)
        } else {
            Err(format!("Please enter a number between 1 and {total}."))
        }
    })?;

    let mut draft = RunConfigDraft {
        method,
        mode,
        count: Some(count),
        range_start: None,
        seed: None,
    };

    match method {
        SelectionMethod::Range => {
            let max_start = max_range_start(total_u32, count);
            let start_prompt = format!("Enter the start number (1 to {max_start}): ");
            let start = ask(input, console, &start_prompt, |raw| {
                let start: u32 = raw.parse().map_err(|_| "Invalid number.".to_string())?;
                if (1..=max_start).contains(&start) {
                    Ok(start)
                } else {
                    Err(format!("The start number must be between 1 and {max_start}."))
                }
            })?;
            draft.range_start = Some(start);
        }
        SelectionMethod::Random | SelectionMethod::Replay => {
            let seed = input.read_line(SEED_PROMPT).ok_or(MenuError::Aborted)?;
            draft.seed = Some(seed);
        }
    }

    draft.validate(total).map_err(MenuError::Config)
}
