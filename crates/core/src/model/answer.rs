use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid answer status: {0}")]
pub struct AnswerStatusError(pub String);

/// Badge state of a question.
///
/// `Doubtful` is a single status, not a flag on top of `Answered`; the selected
/// option survives on the `UserAnswer` while the badge reads doubtful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnswerStatus {
    #[default]
    Unanswered,
    Answered,
    Doubtful,
}

impl AnswerStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerStatus::Unanswered => "unanswered",
            AnswerStatus::Answered => "answered",
            AnswerStatus::Doubtful => "doubtful",
        }
    }

    /// Parses the persisted form produced by [`AnswerStatus::as_str`].
    ///
    /// # Errors
    ///
    /// Returns `AnswerStatusError` for unknown values.
    pub fn parse(s: &str) -> Result<Self, AnswerStatusError> {
        match s {
            "unanswered" => Ok(Self::Unanswered),
            "answered" => Ok(Self::Answered),
            "doubtful" => Ok(Self::Doubtful),
            other => Err(AnswerStatusError(other.to_owned())),
        }
    }
}

/// The user's state for one question during a tryout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAnswer {
    pub question_id: QuestionId,
    pub selected_option: Option<OptionId>,
    pub status: AnswerStatus,
    pub answered_at: DateTime<Utc>,
}

impl UserAnswer {
    #[must_use]
    pub fn selected(question_id: QuestionId, option: OptionId, at: DateTime<Utc>) -> Self {
        Self {
            question_id,
            selected_option: Some(option),
            status: AnswerStatus::Answered,
            answered_at: at,
        }
    }

    #[must_use]
    pub fn unanswered(question_id: QuestionId, at: DateTime<Utc>) -> Self {
        Self {
            question_id,
            selected_option: None,
            status: AnswerStatus::Unanswered,
            answered_at: at,
        }
    }

    /// Record a (re-)selection. Clears a doubtful badge.
    pub fn select(&mut self, option: OptionId, at: DateTime<Utc>) {
        self.selected_option = Some(option);
        self.status = AnswerStatus::Answered;
        self.answered_at = at;
    }

    /// Flip between doubtful and the status implied by the selection.
    pub fn toggle_doubt(&mut self, at: DateTime<Utc>) {
        self.status = match self.status {
            AnswerStatus::Doubtful if self.selected_option.is_some() => AnswerStatus::Answered,
            AnswerStatus::Doubtful => AnswerStatus::Unanswered,
            AnswerStatus::Answered | AnswerStatus::Unanswered => AnswerStatus::Doubtful,
        };
        self.answered_at = at;
    }

    #[must_use]
    pub fn is_doubtful(&self) -> bool {
        self.status == AnswerStatus::Doubtful
    }
}
