use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{AttemptRepository, PackageRepository, QuestionRepository, Storage};

mod attempt_repo;
mod mapping;
mod migrate;
mod package_repo;
mod question_repo;

/// Per-connection pragmas.
///
/// `foreign_keys` must be on for every pooled connection: block results and
/// answers cascade with their attempt, and blocks and options with their
/// package or question. WAL lets the history screen read while a finished
/// attempt is being written.
const CONNECTION_PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON;",
    "PRAGMA journal_mode = WAL;",
    "PRAGMA busy_timeout = 5000;",
];

/// Single-user desktop app; a small pool is enough.
const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Package, question bank and attempt store over one `SQLite` pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open a pool on `database_url` with the tryout pragmas applied to each
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or a pragma
    /// is rejected.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in CONNECTION_PRAGMAS {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the package, question and attempt tables up to the latest
    /// schema version.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration step fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Connect, migrate and hand out the three repository views of one
    /// `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connecting or migrating fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let packages: Arc<dyn PackageRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Ok(Self {
            packages,
            questions,
            attempts,
        })
    }
}
