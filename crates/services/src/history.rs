use chrono::{DateTime, Utc};
use std::sync::Arc;

use storage::repository::{AttemptId, AttemptRepository, AttemptRow, InMemoryRepository};
use tryout_core::model::{BlockResult, FinishReason, PackageId, TryoutAttempt};

use crate::error::TryoutError;

/// Presentation-agnostic list item for a finished attempt.
///
/// No pre-formatted strings; the UI formats timestamps and durations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptListItem {
    pub id: AttemptId,
    pub package_id: PackageId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reason: FinishReason,

    pub total_questions: u32,
    pub answered: u32,
    pub doubtful: u32,
    pub correct: u32,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_row(row: &AttemptRow) -> Self {
        let attempt = &row.attempt;
        let sum = |f: fn(&BlockResult) -> u32| attempt.results().iter().map(f).sum::<u32>();
        Self {
            id: row.id,
            package_id: attempt.package_id(),
            started_at: attempt.started_at(),
            finished_at: attempt.finished_at(),
            reason: attempt.reason(),
            total_questions: attempt.total_questions(),
            answered: sum(BlockResult::answered),
            doubtful: sum(BlockResult::doubtful),
            correct: attempt.total_correct(),
        }
    }

    /// Whole seconds between start and finish.
    #[must_use]
    pub fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }
}

/// Read side of persisted attempts for history and result screens.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Most recent attempts of a package, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TryoutError::Storage` on repository failures.
    pub async fn list_recent_attempts(
        &self,
        package_id: PackageId,
        limit: u32,
    ) -> Result<Vec<AttemptListItem>, TryoutError> {
        let rows = self.attempts.list_attempts(package_id, limit).await?;
        Ok(rows.iter().map(AttemptListItem::from_row).collect())
    }

    /// Load one attempt with its block results.
    ///
    /// # Errors
    ///
    /// Returns `TryoutError::Storage` (`NotFound` for unknown ids).
    pub async fn get_attempt(&self, id: AttemptId) -> Result<TryoutAttempt, TryoutError> {
        Ok(self.attempts.get_attempt(id).await?)
    }
}
