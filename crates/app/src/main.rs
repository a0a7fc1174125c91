use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{
    AppServices, AttemptHistoryService, Clock, PackageCatalogService, TryoutLoopService,
};
use storage::repository::{PackageRepository, Storage};
use tryout_core::model::PackageId;
use ui::{APP_TITLE, App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFile,
    UnknownArg(String),
    InvalidPackageId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFile => write!(f, "import requires a JSON file path"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPackageId { raw } => {
                write!(f, "invalid --package-id value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

struct DesktopApp {
    package_id: PackageId,
    services: AppServices,
}

impl UiApp for DesktopApp {
    fn default_package_id(&self) -> PackageId {
        self.package_id
    }

    fn catalog(&self) -> Arc<PackageCatalogService> {
        self.services.catalog()
    }

    fn history(&self) -> Arc<AttemptHistoryService> {
        self.services.history()
    }

    fn tryout_loop(&self) -> Arc<TryoutLoopService> {
        self.services.tryout_loop()
    }
}

struct Args {
    db_url: String,
    package_id: PackageId,
    file: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ui     [--db <sqlite_url>] [--package-id <id>]");
    eprintln!("  cargo run -p app -- import <file.json> [--db <sqlite_url>]");
    eprintln!("  cargo run -p storage --bin seed -- [--db <sqlite_url>]  # sample package");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  --package-id 1");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  TRYOUT_DB_URL, TRYOUT_PACKAGE_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>, cmd: Command) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TRYOUT_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let mut package_id = std::env::var("TRYOUT_PACKAGE_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| PackageId::new(1), PackageId::new);
        let mut file = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--package-id" => {
                    let value = require_value(args, "--package-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPackageId { raw: value.clone() })?;
                    package_id = PackageId::new(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if cmd == Command::Import && file.is_none() && !arg.starts_with("--") => {
                    file = Some(PathBuf::from(arg));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if cmd == Command::Import && file.is_none() {
            return Err(ArgsError::MissingFile);
        }

        Ok(Self {
            db_url,
            package_id,
            file,
        })
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand launches the UI.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
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
    let parsed = Args::parse(&mut iter, cmd).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite here so core/services stay free of file handling.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let services = AppServices::from_storage(&storage, Clock::default_clock());
    log::info!("opened {}", parsed.db_url);

    match (cmd, parsed.file) {
        (Command::Import, Some(file)) => {
            let report = services.import().import_file(&file).await?;
            println!(
                "imported package {} ({} blocks, {} questions) from {}",
                report.package_id,
                report.blocks,
                report.questions,
                file.display()
            );
            Ok(())
        }
        (Command::Import, None) => Err(ArgsError::MissingFile.into()),
        (Command::Ui, _) => {
            let package_id =
                resolve_default_package(storage.packages.as_ref(), parsed.package_id).await?;
            let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
                package_id,
                services,
            });
            let context = build_app_context(&app);

            // Some desktop setups default to always-on-top; keep it a normal window.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title(APP_TITLE)
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
    }
}

/// The preferred package if stored, else the first one, else the preferred
/// id unchanged so the home screen shows its empty state.
async fn resolve_default_package(
    packages: &dyn PackageRepository,
    preferred_id: PackageId,
) -> Result<PackageId, Box<dyn std::error::Error>> {
    if packages.get_package(preferred_id).await?.is_some() {
        return Ok(preferred_id);
    }

    let existing = packages.list_packages(1).await?;
    match existing.first() {
        Some(first) => {
            log::info!("package {preferred_id} not found, defaulting to {}", first.id());
            Ok(first.id())
        }
        None => {
            log::warn!("no packages stored; import one with `app import <file.json>`");
            Ok(preferred_id)
        }
    }
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

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        // Printed once here; lower layers only return errors.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
