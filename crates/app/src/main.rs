use std::fmt;
use std::path::{Path, PathBuf};

use services::{RunSettingsService, SessionRunner, TranscriptWriter, select};
use storage::location::DEFAULT_SETTINGS_FILE;
use storage::{SettingsLocation, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod console;
mod menu;
mod terminal;

use console::Console;
use menu::MenuError;
use terminal::StdinInput;

const DEFAULT_QUESTIONS: &str = "questions.csv";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDelimiter { raw: String },
    InvalidSettings { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDelimiter { raw } => {
                write!(f, "invalid --delimiter value: {raw} (expected one ASCII character)")
            }
            ArgsError::InvalidSettings { raw } => write!(f, "invalid --settings value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  exam-sim [--questions <csv>] [--settings <path|sqlite:url>] [--results-dir <dir>] [--delimiter <char>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --questions {DEFAULT_QUESTIONS}");
    eprintln!("  --settings {DEFAULT_SETTINGS_FILE}");
    eprintln!("  --results-dir .");
    eprintln!("  --delimiter ,");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAMSIM_QUESTIONS, EXAMSIM_SETTINGS, EXAMSIM_RESULTS_DIR, EXAMSIM_DELIMITER");
    eprintln!("  RUST_LOG (log filter, default: warn)");
}

#[derive(Debug)]
struct Args {
    questions: PathBuf,
    settings: SettingsLocation,
    results_dir: PathBuf,
    delimiter: u8,
}

impl Args {
    /// Parse flags over environment fallbacks. `Ok(None)` means help was requested.
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let mut questions = env("EXAMSIM_QUESTIONS").unwrap_or_else(|| DEFAULT_QUESTIONS.into());
        let mut settings = env("EXAMSIM_SETTINGS").unwrap_or_else(|| DEFAULT_SETTINGS_FILE.into());
        let mut results_dir = env("EXAMSIM_RESULTS_DIR").unwrap_or_else(|| ".".into());
        let mut delimiter = env("EXAMSIM_DELIMITER")
            .map(|raw| parse_delimiter(&raw))
            .transpose()?
            .unwrap_or(b',');

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--questions" => questions = require_value(args, "--questions")?,
                "--settings" => {
                    let value = require_value(args, "--settings")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidSettings { raw: value });
                    }
                    settings = value;
                }
                "--results-dir" => results_dir = require_value(args, "--results-dir")?,
                "--delimiter" => {
                    delimiter = parse_delimiter(&require_value(args, "--delimiter")?)?;
                }
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let settings = match SettingsLocation::parse(&settings) {
            SettingsLocation::Sqlite(url) => SettingsLocation::Sqlite(normalize_sqlite_url(url)),
            json => json,
        };

        Ok(Some(Self {
            questions: PathBuf::from(questions),
            settings,
            results_dir: PathBuf::from(results_dir),
            delimiter,
        }))
    }
}

fn parse_delimiter(raw: &str) -> Result<u8, ArgsError> {
    match raw {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii() => Ok(ch as u8),
        _ => Err(ArgsError::InvalidDelimiter {
            raw: raw.to_string(),
        }),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:")
    {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        // In-memory and `file:` URLs need no file on disk.
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidSettings {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    // Logs go to stderr so they never interleave with the exam on stdout.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if let SettingsLocation::Sqlite(url) = &args.settings {
        prepare_sqlite_file(url)?;
    }
    let storage = Storage::open(&args.questions, args.delimiter, &args.settings).await?;

    let mut console = Console::stdout();
    let mut input = StdinInput;
    console.welcome();

    let set = storage.questions.load_questions().await.map_err(|err| {
        format!(
            "could not load questions from '{}': {err}",
            args.questions.display()
        )
    })?;
    for rejection in &set.rejected {
        console.rejected_row(rejection);
    }
    if set.is_empty() {
        return Err(format!("no valid questions in '{}'", args.questions.display()).into());
    }
    let total = set.len();

    let settings = RunSettingsService::new(storage.settings.clone());
    let remembered = settings.load(total).await?;

    let config =
        match menu::choose_configuration(&mut input, &mut console, total, remembered.as_ref()) {
            Ok(config) => config,
            Err(MenuError::Aborted) => {
                console.line("\nExiting.");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
    info!(
        method = %config.selection_method(),
        mode = %config.mode(),
        count = config.count(),
        "run configured"
    );

    let selected = select(&set.questions, &config)?;
    let outcome = SessionRunner::new(storage.questions.clone())
        .run(selected, config.mode(), &mut input, &mut console)
        .await?;

    let path = TranscriptWriter::new(&args.results_dir).write(&outcome, &config)?;
    console.transcript_saved(&path);

    settings.complete(config, outcome.score).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut argv = std::env::args().skip(1);
    let args = match Args::parse(&mut argv) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            std::process::exit(2);
        }
    };

    init_tracing();

    if let Err(err) = run(args).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
