use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tryout_core::model::{PackageId, Question, QuestionId, TryoutAttempt, TryoutPackage};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<tryout_core::Error> for StorageError {
    fn from(err: tryout_core::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Storage identifier for a persisted attempt (`SQLite` row id).
pub type AttemptId = i64;

/// A persisted attempt with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: AttemptId,
    pub attempt: TryoutAttempt,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: AttemptId, attempt: TryoutAttempt) -> Self {
        Self { id, attempt }
    }
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Persist or replace a package with its blocks.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the package cannot be stored.
    async fn upsert_package(&self, package: &TryoutPackage) -> Result<(), StorageError>;

    /// Fetch a package by ID, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_package(&self, id: PackageId) -> Result<Option<TryoutPackage>, StorageError>;

    /// List packages ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_packages(&self, limit: u32) -> Result<Vec<TryoutPackage>, StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Fetch the questions that exist among `ids`, in the order of `ids`.
    ///
    /// Missing ids are skipped; callers render them as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &TryoutAttempt) -> Result<AttemptId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<TryoutAttempt, StorageError>;

    /// Most recent attempts for a package, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts(
        &self,
        package_id: PackageId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    packages: Arc<Mutex<HashMap<PackageId, TryoutPackage>>>,
    questions: Arc<Mutex<HashMap<QuestionId, Question>>>,
    attempts: Arc<Mutex<Vec<AttemptRow>>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    m.lock().map_err(|e| StorageError::Connection(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageRepository for InMemoryRepository {
    async fn upsert_package(&self, package: &TryoutPackage) -> Result<(), StorageError> {
        lock(&self.packages)?.insert(package.id(), package.clone());
        Ok(())
    }

    async fn get_package(&self, id: PackageId) -> Result<Option<TryoutPackage>, StorageError> {
        Ok(lock(&self.packages)?.get(&id).cloned())
    }

    async fn list_packages(&self, limit: u32) -> Result<Vec<TryoutPackage>, StorageError> {
        let guard = lock(&self.packages)?;
        let mut out: Vec<_> = guard.values().cloned().collect();
        out.sort_by_key(TryoutPackage::id);
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        lock(&self.questions)?.insert(question.id(), question.clone());
        Ok(())
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        let guard = lock(&self.questions)?;
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &TryoutAttempt) -> Result<AttemptId, StorageError> {
        let mut guard = lock(&self.attempts)?;
        let id = AttemptId::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))?;
        guard.push(AttemptRow::new(id, attempt.clone()));
        Ok(id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<TryoutAttempt, StorageError> {
        lock(&self.attempts)?
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.attempt.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        package_id: PackageId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = lock(&self.attempts)?;
        let mut rows: Vec<_> = guard
            .iter()
            .filter(|row| row.attempt.package_id() == package_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.attempt
                .finished_at()
                .cmp(&a.attempt.finished_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub packages: Arc<dyn PackageRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            packages: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            attempts: Arc::new(repo),
        }
    }
}
