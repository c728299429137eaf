use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{ChapterKey, QuestionType};
use storage::json::{QuestionRecord, StoreLayout};

#[derive(Debug, Clone)]
struct Args {
    data_dir: PathBuf,
    chapter: ChapterKey,
    force: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidChapter { raw: String },
    InvalidDataDir { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidChapter { raw } => write!(f, "invalid --chapter value: {raw}"),
            ArgsError::InvalidDataDir { raw } => write!(f, "invalid --data-dir value: {raw}"),
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

fn parse_chapter(raw: String) -> Result<ChapterKey, ArgsError> {
    ChapterKey::new(raw.as_str()).map_err(|_| ArgsError::InvalidChapter { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut data_dir =
            PathBuf::from(std::env::var("QUIZ_DATA_DIR").unwrap_or_else(|_| "data".into()));
        let mut chapter = parse_chapter(
            std::env::var("QUIZ_SEED_CHAPTER").unwrap_or_else(|_| "basics".into()),
        )?;
        let mut force = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => {
                    let value = require_value(&mut args, "--data-dir")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDataDir { raw: value });
                    }
                    data_dir = PathBuf::from(value);
                }
                "--chapter" => {
                    let value = require_value(&mut args, "--chapter")?;
                    chapter = parse_chapter(value)?;
                }
                "--force" => force = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            data_dir,
            chapter,
            force,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --data-dir <dir>          Question data directory (default: data)");
    eprintln!("  --chapter <key>           Chapter key to write (default: basics)");
    eprintln!("  --force                   Overwrite existing question files");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DATA_DIR, QUIZ_SEED_CHAPTER");
}

fn record(question: &str, correct: &[&str], wrong: &[&str], explanation: &str) -> QuestionRecord {
    QuestionRecord {
        question: question.to_owned(),
        correct_answers: correct.iter().map(|s| (*s).to_owned()).collect(),
        wrong_options: wrong.iter().map(|s| (*s).to_owned()).collect(),
        explanation: explanation.to_owned(),
        id: None,
    }
}

fn single_samples() -> Vec<QuestionRecord> {
    vec![
        record(
            "In which Chinese province did Nushu originate?",
            &["Hunan"],
            &["Yunnan", "Guangdong", "Sichuan", "Fujian"],
            "Nushu comes from Jiangyong County in southern Hunan.",
        ),
        record(
            "Who traditionally wrote and read Nushu?",
            &["Women"],
            &["Scholars", "Monks", "Merchants"],
            "Nushu means \"women's script\" and was used among women.",
        ),
        record(
            "What does a Nushu character mostly represent?",
            &["A syllable", "A sound"],
            &["A whole word", "A single letter", "A picture"],
            "Nushu is largely syllabic: each glyph stands for a syllable.",
        ),
        record(
            "Which stroke shape dominates Nushu glyphs?",
            &["Slanted, elongated strokes"],
            &["Square blocks", "Circles", "Dots only"],
            "Glyphs lean to the right and look like thin rhombi.",
        ),
        record(
            "On what objects was Nushu commonly written?",
            &["Fans"],
            &["Bronze vessels", "Oracle bones", "Stone steles"],
            "Fans, handkerchiefs and booklets carried Nushu writing.",
        ),
        record(
            "Which local dialect does Nushu record?",
            &["Chengguan Tuhua"],
            &["Cantonese", "Mandarin", "Hakka"],
            "It records the local Tuhua spoken around Jiangyong.",
        ),
    ]
}

fn multi_samples() -> Vec<QuestionRecord> {
    vec![
        record(
            "Which items were used to carry Nushu texts?",
            &["Fans", "Handkerchiefs", "Booklets", "Embroidery"],
            &["Coins", "Oracle bones", "Clay tablets"],
            "Everyday textiles and paper goods carried the script.",
        ),
        record(
            "Which genres appear in Nushu writing?",
            &["Letters", "Songs", "Autobiographies"],
            &["Legal codes", "Tax records", "Military orders"],
            "Most texts are personal: letters, songs and life stories.",
        ),
        record(
            "Which statements about Nushu are true?",
            &["It is written in columns", "It is phonetic"],
            &["It uses an alphabet", "It was an imperial script", "It is written left to right in rows"],
            "Nushu is phonetic and traditionally written in columns.",
        ),
    ]
}

async fn write_records(
    layout: &StoreLayout,
    chapter: &ChapterKey,
    question_type: QuestionType,
    records: &[QuestionRecord],
    force: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let path = layout.question_path(chapter, question_type);
    if !force && tokio::fs::try_exists(&path).await? {
        return Ok(false);
    }
    tokio::fs::create_dir_all(layout.data_dir()).await?;
    tokio::fs::write(&path, serde_json::to_vec_pretty(records)?).await?;
    Ok(true)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let layout = StoreLayout::new(&args.data_dir, args.data_dir.join("settings.json"));
    let sets = [
        (QuestionType::Single, single_samples()),
        (QuestionType::Multi, multi_samples()),
    ];

    for (question_type, records) in &sets {
        let written =
            write_records(&layout, &args.chapter, *question_type, records, args.force).await?;
        let path = layout.question_path(&args.chapter, *question_type);
        if written {
            println!("Wrote {} {question_type} questions to {}", records.len(), path.display());
        } else {
            println!("Kept existing {} (use --force to overwrite)", path.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
