use thiserror::Error;

use crate::model::{AnswerStatusError, BlockResultError, PackageError, QuestionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] BlockResultError),
    #[error(transparent)]
    AnswerStatus(#[from] AnswerStatusError),
}
