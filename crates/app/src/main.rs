use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{ChapterCatalog, ChapterKey, QuizSettingsDraft, StudyMode};
use services::{Clock, ProgressService, RoundLoopService, SettingsService};
use storage::json::StoreLayout;
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod round;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingChapter { command: &'static str },
    UnknownArg(String),
    InvalidChapter { raw: String },
    InvalidPath { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingChapter { command } => write!(f, "{command} requires a chapter"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidChapter { raw } => write!(f, "invalid chapter: {raw}"),
            ArgsError::InvalidPath { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn require_path(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<PathBuf, ArgsError> {
    let value = require_value(args, flag)?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidPath { flag, raw: value });
    }
    Ok(PathBuf::from(value))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- chapters            [--data-dir <dir>] [--settings <file>]");
    eprintln!("  cargo run -p app -- learn <chapter>     [--data-dir <dir>] [--settings <file>]");
    eprintln!("  cargo run -p app -- review <chapter>    [--data-dir <dir>] [--settings <file>]");
    eprintln!("  cargo run -p app -- reset <chapter>     [--data-dir <dir>]");
    eprintln!("  cargo run -p app -- settings [--questions <n>] [--settings <file>]");
    eprintln!("  cargo run -p app -- init                [--data-dir <dir>] [--settings <file>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --data-dir data");
    eprintln!("  --settings state/settings.json");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DATA_DIR, QUIZ_SETTINGS, QUIZ_LOG (default: warn)");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Chapters,
    Round { chapter: ChapterKey, mode: StudyMode },
    Reset { chapter: ChapterKey },
    Settings { questions: Option<String> },
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Chapters,
    Learn,
    Review,
    Reset,
    Settings,
    Init,
}

impl CommandKind {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "chapters" => Some(Self::Chapters),
            "learn" => Some(Self::Learn),
            "review" => Some(Self::Review),
            "reset" => Some(Self::Reset),
            "settings" => Some(Self::Settings),
            "init" => Some(Self::Init),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Chapters => "chapters",
            Self::Learn => "learn",
            Self::Review => "review",
            Self::Reset => "reset",
            Self::Settings => "settings",
            Self::Init => "init",
        }
    }

    fn takes_chapter(self) -> bool {
        matches!(self, Self::Learn | Self::Review | Self::Reset)
    }
}

struct Args {
    data_dir: PathBuf,
    settings_path: PathBuf,
    command: Command,
}

impl Args {
    fn parse(kind: CommandKind, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut data_dir =
            PathBuf::from(std::env::var("QUIZ_DATA_DIR").unwrap_or_else(|_| "data".into()));
        let mut settings_path = PathBuf::from(
            std::env::var("QUIZ_SETTINGS").unwrap_or_else(|_| "state/settings.json".into()),
        );
        let mut chapter: Option<ChapterKey> = None;
        let mut questions: Option<String> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => data_dir = require_path(args, "--data-dir")?,
                "--settings" => settings_path = require_path(args, "--settings")?,
                "--questions" if kind == CommandKind::Settings => {
                    questions = Some(require_value(args, "--questions")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if kind.takes_chapter() && chapter.is_none() && !arg.starts_with("--") => {
                    chapter = Some(
                        ChapterKey::new(arg.as_str())
                            .map_err(|_| ArgsError::InvalidChapter { raw: arg.clone() })?,
                    );
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let mut chapter_for = |command: &'static str| {
            chapter
                .take()
                .ok_or(ArgsError::MissingChapter { command })
        };
        let command = match kind {
            CommandKind::Chapters => Command::Chapters,
            CommandKind::Learn => Command::Round {
                chapter: chapter_for(kind.name())?,
                mode: StudyMode::LearnNew,
            },
            CommandKind::Review => Command::Round {
                chapter: chapter_for(kind.name())?,
                mode: StudyMode::ReviewOld,
            },
            CommandKind::Reset => Command::Reset {
                chapter: chapter_for(kind.name())?,
            },
            CommandKind::Settings => Command::Settings { questions },
            CommandKind::Init => Command::Init,
        };

        Ok(Self {
            data_dir,
            settings_path,
            command,
        })
    }
}

fn init_tracing() {
    let filter = std::env::var("QUIZ_LOG")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();
    let first = argv.peek().cloned();

    // Default behavior: list chapters when no subcommand is provided.
    let kind = match first.as_deref() {
        None => CommandKind::Chapters,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => CommandKind::Chapters,
        Some(first) => {
            let kind = CommandKind::from_arg(first).ok_or_else(|| {
                eprintln!("unknown subcommand: {first}");
                print_usage();
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
            })?;
            argv.next();
            kind
        }
    };

    let parsed = Args::parse(kind, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    tracing::debug!(
        command = kind.name(),
        data_dir = %parsed.data_dir.display(),
        settings = %parsed.settings_path.display(),
        "parsed arguments"
    );

    let storage = Storage::json(StoreLayout::new(parsed.data_dir, parsed.settings_path));
    let catalog = ChapterCatalog::default();
    let progress = ProgressService::new(Arc::clone(&storage.questions), Arc::clone(&storage.progress));
    let settings = SettingsService::new(Arc::clone(&storage.settings));

    match parsed.command {
        Command::Chapters => {
            let overviews = progress.overviews(&catalog).await?;
            if overviews.is_empty() {
                println!("No chapters with questions found.");
            }
            for overview in overviews {
                let marker = if overview.is_complete() { " (complete)" } else { "" };
                println!(
                    "{:<12} {:<36} {:>3}/{:<3} {:>5.1}%{marker}",
                    overview.key.as_str(),
                    overview.title,
                    overview.learned,
                    overview.total,
                    overview.ratio() * 100.0,
                );
            }
            Ok(())
        }
        Command::Round { chapter, mode } => {
            let service = RoundLoopService::new(
                Clock::default_clock(),
                Arc::clone(&storage.questions),
                progress,
                settings,
            );
            println!("{} ({mode})", catalog.title_of(&chapter));
            round::run_rounds(&service, &chapter, mode).await
        }
        Command::Reset { chapter } => {
            let reset = progress.reset_chapter(&chapter).await?;
            if reset.is_empty() {
                println!("No question files for {chapter}; nothing to reset.");
            } else {
                println!("Progress for {} reset.", catalog.title_of(&chapter));
            }
            Ok(())
        }
        Command::Settings { questions } => {
            let current = match questions {
                Some(raw) => settings.save(QuizSettingsDraft::new(raw)).await?,
                None => settings.load().await?,
            };
            println!("questions per session: {}", current.questions_per_session());
            Ok(())
        }
        Command::Init => {
            let current = settings.load().await?;
            for chapter in catalog.chapters() {
                let created = progress.ensure_progress(chapter.key()).await?;
                for question_type in created {
                    println!("initialised {} {question_type} progress", chapter.key());
                }
            }
            println!("questions per session: {}", current.questions_per_session());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "command failed");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: CommandKind, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|a| (*a).to_owned());
        Args::parse(kind, &mut iter)
    }

    #[test]
    fn learn_takes_a_chapter_and_paths() {
        let args = parse(CommandKind::Learn, &["basics", "--data-dir", "/tmp/quiz"]).unwrap();
        assert_eq!(args.data_dir, PathBuf::from("/tmp/quiz"));
        assert_eq!(
            args.command,
            Command::Round {
                chapter: ChapterKey::new("basics").unwrap(),
                mode: StudyMode::LearnNew,
            }
        );
    }

    #[test]
    fn missing_or_invalid_chapter_is_rejected() {
        assert!(matches!(
            parse(CommandKind::Review, &[]),
            Err(ArgsError::MissingChapter { command: "review" })
        ));
        assert!(matches!(
            parse(CommandKind::Reset, &["../etc"]),
            Err(ArgsError::InvalidChapter { .. })
        ));
    }

    #[test]
    fn questions_flag_only_applies_to_settings() {
        let args = parse(CommandKind::Settings, &["--questions", "20"]).unwrap();
        assert_eq!(
            args.command,
            Command::Settings {
                questions: Some("20".to_owned())
            }
        );
        assert!(matches!(
            parse(CommandKind::Chapters, &["--questions", "20"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }
}
