use std::sync::Arc;
use std::time::Duration;

use storage::repository::{
    AttemptId, AttemptRepository, PackageRepository, QuestionRepository, StorageError,
};
use tryout_core::TryoutPlayer;
use tryout_core::model::{AnswerKey, PackageId};

use super::run::TryoutRun;
use super::timer::TICK_PERIOD;
use crate::Clock;
use crate::error::TryoutError;

/// Orchestrates tryout start, finish and attempt persistence.
#[derive(Clone)]
pub struct TryoutLoopService {
    clock: Clock,
    packages: Arc<dyn PackageRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
    tick_period: Duration,
}

impl TryoutLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        packages: Arc<dyn PackageRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            packages,
            questions,
            attempts,
            tick_period: TICK_PERIOD,
        }
    }

    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    /// Load a package with its questions and start the first block.
    ///
    /// Must be called inside a tokio runtime: the countdown is a spawned task.
    ///
    /// # Errors
    ///
    /// Returns `TryoutError::Storage(StorageError::NotFound)` for an unknown
    /// package, `TryoutError::Empty` if it has no blocks, and
    /// `TryoutError::Storage` for backend failures.
    pub async fn start_tryout(&self, package_id: PackageId) -> Result<TryoutRun, TryoutError> {
        let package = self
            .packages
            .get_package(package_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        if package.block_count() == 0 {
            return Err(TryoutError::Empty);
        }

        let ids: Vec<_> = package.question_ids().collect();
        let questions = self.questions.get_questions(&ids).await?;
        if questions.len() < ids.len() {
            log::warn!(
                "package {package_id}: {} of {} questions missing from the bank",
                ids.len() - questions.len(),
                ids.len()
            );
        }

        let key = AnswerKey::from_questions(&questions);
        log::info!(
            "starting tryout {package_id} ({} blocks, {} questions, {} minutes)",
            package.block_count(),
            package.total_questions(),
            package.total_minutes()
        );
        let player = TryoutPlayer::new(package, key);
        Ok(TryoutRun::start(player, questions, self.clock, self.tick_period))
    }

    /// Finish the run manually and persist the attempt.
    ///
    /// # Errors
    ///
    /// Returns `TryoutError::Storage` if persistence fails. The run stays
    /// finished; call [`Self::finalize_attempt`] to retry.
    pub async fn finish(&self, run: &TryoutRun) -> Result<AttemptId, TryoutError> {
        run.finish();
        self.finalize_attempt(run).await
    }

    /// Persist the attempt once the run has finished on its own.
    ///
    /// Returns `Ok(None)` while the run is still in progress.
    ///
    /// # Errors
    ///
    /// Returns `TryoutError::Storage` if persistence fails.
    pub async fn persist_if_finished(
        &self,
        run: &TryoutRun,
    ) -> Result<Option<AttemptId>, TryoutError> {
        if !run.is_finished() {
            return Ok(None);
        }
        self.finalize_attempt(run).await.map(Some)
    }

    /// Persist a finished run's attempt, at most once.
    ///
    /// Useful to retry after a failed append (e.g. transient storage error).
    ///
    /// # Errors
    ///
    /// Returns `TryoutError::NotFinished` if the run is still in progress.
    /// Returns `TryoutError::Storage` if persistence fails.
    pub async fn finalize_attempt(&self, run: &TryoutRun) -> Result<AttemptId, TryoutError> {
        let _guard = run.persist_guard().await;
        if let Some(id) = run.attempt_id() {
            return Ok(id);
        }

        let attempt = run.attempt().ok_or(TryoutError::NotFinished)?;
        match self.attempts.append_attempt(&attempt).await {
            Ok(id) => {
                run.set_attempt_id(id);
                log::info!(
                    "persisted attempt {id} for package {} ({}/{} correct)",
                    attempt.package_id(),
                    attempt.total_correct(),
                    attempt.total_questions()
                );
                Ok(id)
            }
            Err(err) => {
                log::warn!(
                    "failed to persist attempt for package {}: {err}",
                    attempt.package_id()
                );
                Err(err.into())
            }
        }
    }
}
