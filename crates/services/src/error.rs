//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tryout_core::model::{PackageError, QuestionError, QuestionId};

/// Errors emitted while running a tryout.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TryoutError {
    #[error("package has no blocks")]
    Empty,
    #[error("tryout is not finished yet")]
    NotFinished,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TryoutError {
    /// `true` when the requested package or attempt does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound))
    }
}

/// Errors emitted by `PackageImportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("failed to read package file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid package document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("correct answer {label:?} of question {question_id} matches no option label")]
    UnknownCorrectLabel {
        question_id: QuestionId,
        label: String,
    },
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
