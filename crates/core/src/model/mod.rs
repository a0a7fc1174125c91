mod answer;
mod ids;
mod package;
mod question;
mod result;

pub use ids::{BlockId, OptionId, PackageId, ParseIdError, QuestionId};

pub use answer::{AnswerStatus, AnswerStatusError, UserAnswer};
pub use package::{Block, PackageError, TryoutPackage};
pub use question::{AnswerKey, AnswerOption, Question, QuestionError};
pub use result::{BlockResult, BlockResultError, FinishReason, TryoutAttempt};
