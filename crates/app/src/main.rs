mod terminal;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{ConfigError, Difficulty, QuestionSource, QuizConfigDraft, QuizMode};
use quiz_core::timer::LOW_TIME_THRESHOLD;
use services::quiz::{ResultsExport, export_file_name};
use services::{
    Clock, QuizEngine, QuizState, Resume, TickReport, Ticker, TriviaConfig, TriviaProvider,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::terminal::{Input, TerminalPresenter};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidMode { raw: String },
    InvalidSource { raw: String },
    InvalidDifficulty { raw: String },
    InvalidDbUrl { raw: String },
    Config(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (practice or test)")
            }
            ArgsError::InvalidSource { raw } => {
                write!(f, "invalid --source value: {raw} (local or remote)")
            }
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} (easy, medium or hard)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::Config(err) => write!(f, "{err}"),
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

fn require_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber {
            flag,
            raw: value.clone(),
        })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [play] [--db <sqlite_url>] [quiz options]");
    eprintln!("  quiz resume [--db <sqlite_url>]");
    eprintln!("  quiz export [--db <sqlite_url>] [--out <path>]");
    eprintln!("  quiz clear  [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Quiz options:");
    eprintln!("  --mode practice|test      (default practice)");
    eprintln!("  --time <seconds>          per question, 5-300 (default 30)");
    eprintln!("  --count <n>               questions, 1-50 (default 10)");
    eprintln!("  --source local|remote     (default local)");
    eprintln!("  --category <id>           remote category filter");
    eprintln!("  --difficulty easy|medium|hard");
    eprintln!("  --no-shuffle              keep question order");
    eprintln!("  --no-shuffle-choices      keep choice order");
    eprintln!("  --sound                   terminal bell on answers");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_TRIVIA_BASE_URL, QUIZ_LOCAL_QUESTIONS, QUIZ_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Resume,
    Export,
    Clear,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "resume" => Some(Self::Resume),
            "export" => Some(Self::Export),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    quiz: QuizConfigDraft,
    out: Option<PathBuf>,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut quiz = QuizConfigDraft::new();
        let mut out = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--out" if cmd == Command::Export => {
                    out = Some(PathBuf::from(require_value(args, "--out")?));
                }
                "--mode" if cmd == Command::Play => {
                    let value = require_value(args, "--mode")?;
                    quiz.mode =
                        QuizMode::parse(&value).ok_or(ArgsError::InvalidMode { raw: value })?;
                }
                "--time" if cmd == Command::Play => {
                    quiz.time_per_question = require_number(args, "--time")?;
                }
                "--count" if cmd == Command::Play => {
                    quiz.question_count = require_number(args, "--count")?;
                }
                "--source" if cmd == Command::Play => {
                    let value = require_value(args, "--source")?;
                    quiz.source = QuestionSource::parse(&value)
                        .ok_or(ArgsError::InvalidSource { raw: value })?;
                }
                "--category" if cmd == Command::Play => {
                    quiz.category = Some(require_number(args, "--category")?);
                }
                "--difficulty" if cmd == Command::Play => {
                    let value = require_value(args, "--difficulty")?;
                    let difficulty = Difficulty::parse(&value);
                    if !difficulty.is_known() {
                        return Err(ArgsError::InvalidDifficulty { raw: value });
                    }
                    quiz.difficulty = Some(difficulty);
                }
                "--no-shuffle" if cmd == Command::Play => quiz.shuffle_questions = false,
                "--no-shuffle-choices" if cmd == Command::Play => quiz.shuffle_choices = false,
                "--sound" if cmd == Command::Play => quiz.sound_enabled = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, quiz, out })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
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
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
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

/// Logs go to stderr so they never interleave with the quiz on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(storage: &Storage) -> Result<QuizEngine, Box<dyn std::error::Error>> {
    let provider = TriviaProvider::new(TriviaConfig::from_env()?);
    Ok(QuizEngine::new(
        Clock::system(),
        Arc::new(provider),
        Arc::clone(&storage.sessions),
        Arc::new(TerminalPresenter),
    ))
}

async fn write_export(json: String, out: Option<PathBuf>) -> std::io::Result<PathBuf> {
    let path = out.unwrap_or_else(|| PathBuf::from(export_file_name(Clock::system().now())));
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

enum Flow {
    Continue,
    Quit,
}

async fn apply(engine: &mut QuizEngine, input: Input) -> Result<Flow, Box<dyn std::error::Error>> {
    match input {
        Input::Choose(position) => {
            let value = engine
                .snapshot()
                .zip(position.checked_sub(1))
                .and_then(|(s, idx)| s.choice_at(idx).map(str::to_owned))
                .ok_or_else(|| format!("no choice {position}"))?;
            engine.select_choice(&value).await?;
        }
        Input::Next => {
            if let services::NextOrSubmit::Advanced(advance) = engine.next_or_submit().await? {
                if !advance.moved() {
                    println!("Last question. Type `end` to finish.");
                }
            }
        }
        Input::Prev => {
            if !engine.prev().await?.moved() {
                println!("Already at the first question.");
            }
        }
        Input::Skip => {
            if !engine.skip().await?.moved() {
                println!("Last question. Type `end` to finish.");
            }
        }
        Input::Jump(number) => {
            let moved = match number.checked_sub(1) {
                Some(idx) => engine.jump_to(idx).await?.moved(),
                None => false,
            };
            if !moved {
                println!("No move to question {number}.");
            }
        }
        Input::Review => {
            engine.toggle_review().await?;
        }
        Input::Pause => {
            if engine.toggle_pause().await? == QuizState::Paused {
                println!("Paused. Type `pause` again to continue.");
            }
        }
        Input::Submit => {
            engine.submit().await?;
        }
        Input::End => {
            engine.end().await?;
        }
        Input::Export => {
            let json = engine.export_json()?;
            let path = write_export(json, None).await?;
            println!("Saved {}", path.display());
        }
        Input::Help => terminal::print_help(),
        Input::Quit => return Ok(Flow::Quit),
        Input::Unknown(raw) => println!("Unknown command: {raw} (type `help`)"),
    }
    Ok(Flow::Continue)
}

/// Interactive loop: stdin lines and timer ticks on one task.
async fn play(engine: &mut QuizEngine) -> Result<(), Box<dyn std::error::Error>> {
    terminal::print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = Ticker::new();
    ticker.sync(engine.timer());

    while engine.state() != QuizState::Finished {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match apply(engine, Input::parse(&line)).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        println!("Session saved. Run `quiz resume` to continue.");
                        break;
                    }
                    Err(err) => println!("{err}"),
                }
            }
            () = ticker.tick() => {
                if let TickReport::Counted { remaining } = engine.tick().await {
                    if remaining <= LOW_TIME_THRESHOLD {
                        terminal::print_low_time(remaining);
                    }
                }
            }
        }
        ticker.sync(engine.timer());
    }

    if engine.state() == QuizState::Finished {
        println!("Type `quiz export` to save these results.");
    }
    Ok(())
}

async fn export_saved(
    storage: &Storage,
    out: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(session) = storage.sessions.load().await? else {
        eprintln!("No saved session found");
        return Ok(());
    };
    let export = ResultsExport::from_session(&session, Clock::system().now());
    let json = export.to_json_pretty()?;
    let path = write_export(json, out).await?;
    println!("Results exported successfully: {}", path.display());
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite in the binary so core/services stay storage-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    tracing::debug!(db = %parsed.db_url, ?cmd, "opening session store");
    let storage = Storage::sqlite(&parsed.db_url).await?;

    match cmd {
        Command::Play => {
            let config = parsed.quiz.validate().map_err(ArgsError::Config)?;
            let mut engine = build_engine(&storage)?;
            engine.start_session(config).await?;
            play(&mut engine).await
        }
        Command::Resume => {
            let mut engine = build_engine(&storage)?;
            if engine.resume_session().await == Resume::NothingSaved {
                return Ok(());
            }
            if let Some(summary) = engine
                .compute_summary()
                .filter(|_| engine.state() == QuizState::Finished)
            {
                print!("{}", terminal::render_summary(&summary));
                return Ok(());
            }
            play(&mut engine).await
        }
        Command::Export => export_saved(&storage, parsed.out).await,
        Command::Clear => {
            storage.sessions.clear().await?;
            println!("Saved session cleared.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(ToString::to_string);
        Args::parse(cmd, &mut iter)
    }

    #[test]
    fn play_flags_fill_the_draft() {
        let args = parse(
            Command::Play,
            &[
                "--db",
                "sqlite::memory:",
                "--mode",
                "test",
                "--time",
                "45",
                "--count",
                "5",
                "--source",
                "remote",
                "--category",
                "9",
                "--difficulty",
                "hard",
                "--no-shuffle",
                "--sound",
            ],
        )
        .unwrap();

        assert_eq!(args.db_url, "sqlite::memory:");
        let config = args.quiz.validate().unwrap();
        assert_eq!(config.mode(), QuizMode::Test);
        assert_eq!(config.time_per_question(), 45);
        assert_eq!(config.question_count(), 5);
        assert_eq!(config.source(), QuestionSource::Remote);
        assert_eq!(config.category(), Some(9));
        assert_eq!(config.difficulty(), Some(Difficulty::Hard));
        assert!(!config.shuffle_questions());
        assert!(config.shuffle_choices());
        assert!(config.sound_enabled());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse(Command::Play, &["--mode", "exam"]),
            Err(ArgsError::InvalidMode { .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--time", "soon"]),
            Err(ArgsError::InvalidNumber { flag: "--time", .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--difficulty", "brutal"]),
            Err(ArgsError::InvalidDifficulty { .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--count"]),
            Err(ArgsError::MissingValue { flag: "--count" })
        ));
        assert!(matches!(
            parse(Command::Play, &["--db", " "]),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
    }

    #[test]
    fn quiz_flags_only_apply_to_play() {
        assert!(matches!(
            parse(Command::Clear, &["--mode", "test"]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(Command::Play, &["--out", "x.json"]),
            Err(ArgsError::UnknownArg(_))
        ));
        let args = parse(Command::Export, &["--out", "results.json"]).unwrap();
        assert_eq!(args.out, Some(PathBuf::from("results.json")));
    }

    #[test]
    fn out_of_range_time_fails_validation() {
        let args = parse(Command::Play, &["--time", "301"]).unwrap();
        assert!(matches!(
            args.quiz.validate(),
            Err(ConfigError::InvalidTimePerQuestion(301))
        ));
    }

    async fn started_test_quiz() -> QuizEngine {
        let config = TriviaConfig::new("https://opentdb.com", "/definitely/not/here.json").unwrap();
        let storage = Storage::in_memory();
        let mut engine = QuizEngine::new(
            Clock::fixed(quiz_core::time::fixed_now()),
            Arc::new(TriviaProvider::new(config)),
            Arc::clone(&storage.sessions),
            Arc::new(services::SilentPresenter),
        )
        .with_seed(7);
        let quiz = QuizConfigDraft {
            mode: QuizMode::Test,
            source: QuestionSource::Local,
            ..QuizConfigDraft::default()
        }
        .validate()
        .unwrap();
        engine.start_session(quiz).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn choice_zero_records_nothing() {
        let mut engine = started_test_quiz().await;
        let err = apply(&mut engine, Input::Choose(0)).await.err().unwrap();
        assert_eq!(err.to_string(), "no choice 0");
        assert!(engine.session().unwrap().answers().is_empty());

        assert!(apply(&mut engine, Input::Choose(1)).await.is_ok());
        assert_eq!(engine.session().unwrap().answered_count(), 1);
    }

    #[tokio::test]
    async fn jump_to_zero_stays_put() {
        let mut engine = started_test_quiz().await;
        assert!(apply(&mut engine, Input::Jump(2)).await.is_ok());
        assert_eq!(engine.session().unwrap().current_index(), 1);

        assert!(apply(&mut engine, Input::Jump(0)).await.is_ok());
        assert_eq!(engine.session().unwrap().current_index(), 1);
    }

    #[test]
    fn sqlite_urls_are_normalized() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db"
        );
        assert!(normalize_sqlite_url("quiz.db".into()).ends_with("/quiz.db"));
    }
}
