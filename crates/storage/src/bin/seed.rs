use std::fmt;

use storage::repository::Storage;
use tryout_core::model::{
    AnswerOption, Block, BlockId, OptionId, PackageId, Question, QuestionId, TryoutPackage,
};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    package_id: PackageId,
    title: String,
    minutes: Option<u32>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPackageId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidMinutes { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPackageId { raw } => write!(f, "invalid --package-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidMinutes { raw } => write!(f, "invalid --minutes value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TRYOUT_DB_URL")
            .unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut package_id = std::env::var("TRYOUT_PACKAGE_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| PackageId::new(1), PackageId::new);
        let mut title =
            std::env::var("TRYOUT_PACKAGE_TITLE").unwrap_or_else(|_| "Tryout SNBT #1".into());
        let mut minutes = std::env::var("TRYOUT_BLOCK_MINUTES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--package-id" => {
                    let value = require_value(&mut args, "--package-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPackageId { raw: value.clone() })?;
                    package_id = PackageId::new(parsed);
                }
                "--title" => {
                    title = require_value(&mut args, "--title")?;
                }
                "--minutes" => {
                    let value = require_value(&mut args, "--minutes")?;
                    minutes = Some(
                        value
                            .parse::<u32>()
                            .map_err(|_| ArgsError::InvalidMinutes { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            package_id,
            title,
            minutes,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --package-id <id>         Package id to upsert (default: 1)");
    eprintln!("  --title <text>            Package title (default: Tryout SNBT #1)");
    eprintln!("  --minutes <n>             Override every block duration (minutes)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TRYOUT_DB_URL, TRYOUT_PACKAGE_ID, TRYOUT_PACKAGE_TITLE, TRYOUT_BLOCK_MINUTES");
}

struct SampleQuestion {
    text: &'static str,
    options: [&'static str; 5],
    correct: usize,
    explanation: &'static str,
}

struct SampleBlock {
    name: &'static str,
    minutes: u32,
    questions: &'static [SampleQuestion],
}

const SAMPLE_BLOCKS: &[SampleBlock] = &[
    SampleBlock {
        name: "Penalaran Umum",
        minutes: 10,
        questions: &[
            SampleQuestion {
                text: "Semua peserta tryout membawa kartu ujian. Sebagian peserta membawa kalkulator. Simpulan yang tepat adalah...",
                options: [
                    "Semua peserta membawa kalkulator",
                    "Sebagian peserta yang membawa kartu ujian membawa kalkulator",
                    "Tidak ada peserta yang membawa kalkulator",
                    "Peserta yang membawa kalkulator tidak membawa kartu ujian",
                    "Semua yang membawa kalkulator bukan peserta",
                ],
                correct: 1,
                explanation: "Sebagian peserta membawa kalkulator dan semua peserta membawa kartu ujian.",
            },
            SampleQuestion {
                text: "Barisan 2, 6, 12, 20, 30, ... Bilangan berikutnya adalah...",
                options: ["38", "40", "42", "44", "46"],
                correct: 2,
                explanation: "Selisihnya 4, 6, 8, 10, sehingga berikutnya bertambah 12.",
            },
            SampleQuestion {
                text: "Jika hujan maka jalan basah. Jalan tidak basah. Simpulan yang sah adalah...",
                options: [
                    "Hujan",
                    "Tidak hujan",
                    "Jalan basah",
                    "Mungkin hujan",
                    "Tidak dapat disimpulkan",
                ],
                correct: 1,
                explanation: "Modus tollens: bukan q maka bukan p.",
            },
        ],
    },
    SampleBlock {
        name: "Pengetahuan Kuantitatif",
        minutes: 15,
        questions: &[
            SampleQuestion {
                text: "Nilai dari 3x + 5 = 20 adalah x = ...",
                options: ["3", "4", "5", "6", "7"],
                correct: 2,
                explanation: "3x = 15 sehingga x = 5.",
            },
            SampleQuestion {
                text: "Rata-rata dari 4, 8, 10, dan 14 adalah...",
                options: ["8", "9", "9,5", "10", "11"],
                correct: 1,
                explanation: "Jumlahnya 36 dibagi 4 sama dengan 9.",
            },
        ],
    },
];

const OPTION_LABELS: [&str; 5] = ["A", "B", "C", "D", "E"];

fn build_sample(
    package_id: PackageId,
    title: &str,
    minutes: Option<u32>,
) -> Result<(TryoutPackage, Vec<Question>), Box<dyn std::error::Error>> {
    let base = package_id.value().saturating_mul(1_000);
    let mut next_question = base;
    let mut blocks = Vec::with_capacity(SAMPLE_BLOCKS.len());
    let mut questions = Vec::new();

    for (block_pos, sample) in (1_u64..).zip(SAMPLE_BLOCKS) {
        let mut ids = Vec::with_capacity(sample.questions.len());
        for q in sample.questions {
            next_question += 1;
            let id = QuestionId::new(next_question);
            let options = (1_u64..)
                .zip(OPTION_LABELS.iter().zip(q.options.iter()))
                .map(|(oid, (label, text))| AnswerOption::new(OptionId::new(oid), *label, *text))
                .collect::<Vec<_>>();
            let correct = OptionId::new(q.correct as u64 + 1);
            questions.push(Question::new(
                id,
                q.text,
                options,
                correct,
                Some(q.explanation.to_string()),
            )?);
            ids.push(id);
        }
        blocks.push(Block::new(
            BlockId::new(base + block_pos),
            sample.name,
            ids,
            minutes.unwrap_or(sample.minutes),
        )?);
    }

    Ok((TryoutPackage::new(package_id, title, blocks)?, questions))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let (package, questions) = build_sample(args.package_id, &args.title, args.minutes)?;

    for question in &questions {
        storage.questions.upsert_question(question).await?;
    }
    storage.packages.upsert_package(&package).await?;

    println!(
        "Seeded package {} ({} blocks, {} questions) into {}",
        package.id().value(),
        package.block_count(),
        questions.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
