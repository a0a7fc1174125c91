use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::answer::{AnswerStatus, UserAnswer};
use crate::model::ids::{BlockId, PackageId, QuestionId};
use crate::model::package::Block;
use crate::model::question::AnswerKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlockResultError {
    #[error("answered ({answered}) + blank ({blank}) does not match total ({total})")]
    CountMismatch { total: u32, answered: u32, blank: u32 },

    #[error("doubtful ({doubtful}) exceeds answered ({answered})")]
    TooManyDoubtful { answered: u32, doubtful: u32 },

    #[error("correct ({correct}) + incorrect ({incorrect}) exceeds answered ({answered})")]
    TooManyGraded {
        answered: u32,
        correct: u32,
        incorrect: u32,
    },

    #[error("finished_at is before started_at")]
    InvalidTimeRange,

    #[error("invalid finish reason: {0}")]
    InvalidFinishReason(String),
}

//
// ─── FINISH REASON ─────────────────────────────────────────────────────────────
//

/// Why a tryout ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The user finished (or submitted the last block) before time ran out.
    Manual,
    /// The last block's countdown reached zero.
    TimeUp,
}

impl FinishReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FinishReason::Manual => "manual",
            FinishReason::TimeUp => "time_up",
        }
    }

    /// # Errors
    ///
    /// Returns `BlockResultError::InvalidFinishReason` for unknown values.
    pub fn parse(s: &str) -> Result<Self, BlockResultError> {
        match s {
            "manual" => Ok(Self::Manual),
            "time_up" => Ok(Self::TimeUp),
            other => Err(BlockResultError::InvalidFinishReason(other.to_owned())),
        }
    }
}

//
// ─── BLOCK RESULT ──────────────────────────────────────────────────────────────
//

/// Read-only per-block summary computed once the exam finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockResult {
    block_id: BlockId,
    block_name: String,
    total_questions: u32,
    answered: u32,
    blank: u32,
    doubtful: u32,
    correct: u32,
    incorrect: u32,
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl BlockResult {
    /// Tabulate one block from the session's answers.
    ///
    /// `answered` counts every question whose status is not `Unanswered`, so a
    /// doubtful question without a selection still counts as answered.
    #[must_use]
    pub fn tabulate(
        block: &Block,
        answers: &HashMap<QuestionId, UserAnswer>,
        key: &AnswerKey,
    ) -> Self {
        let mut answered = 0_usize;
        let mut doubtful = 0_usize;
        let mut correct = 0_usize;
        let mut incorrect = 0_usize;

        for question_id in block.question_ids() {
            let Some(answer) = answers.get(question_id) else {
                continue;
            };
            if answer.status != AnswerStatus::Unanswered {
                answered += 1;
            }
            if answer.status == AnswerStatus::Doubtful {
                doubtful += 1;
            }
            if let Some(selected) = answer.selected_option {
                match key.grade(*question_id, selected) {
                    Some(true) => correct += 1,
                    Some(false) => incorrect += 1,
                    None => {}
                }
            }
        }

        let total = block.len();
        Self {
            block_id: block.id(),
            block_name: block.name().to_owned(),
            total_questions: count_u32(total),
            answered: count_u32(answered),
            blank: count_u32(total.saturating_sub(answered)),
            doubtful: count_u32(doubtful),
            correct: count_u32(correct),
            incorrect: count_u32(incorrect),
        }
    }

    /// Rehydrate a block result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `BlockResultError` if the counts are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        block_id: BlockId,
        block_name: String,
        total_questions: u32,
        answered: u32,
        blank: u32,
        doubtful: u32,
        correct: u32,
        incorrect: u32,
    ) -> Result<Self, BlockResultError> {
        if answered.checked_add(blank) != Some(total_questions) {
            return Err(BlockResultError::CountMismatch {
                total: total_questions,
                answered,
                blank,
            });
        }
        if doubtful > answered {
            return Err(BlockResultError::TooManyDoubtful { answered, doubtful });
        }
        if correct.saturating_add(incorrect) > answered {
            return Err(BlockResultError::TooManyGraded {
                answered,
                correct,
                incorrect,
            });
        }
        Ok(Self {
            block_id,
            block_name,
            total_questions,
            answered,
            blank,
            doubtful,
            correct,
            incorrect,
        })
    }

    #[must_use]
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    #[must_use]
    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn blank(&self) -> u32 {
        self.blank
    }

    #[must_use]
    pub fn doubtful(&self) -> u32 {
        self.doubtful
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// A finished tryout session as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryoutAttempt {
    package_id: PackageId,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    reason: FinishReason,
    results: Vec<BlockResult>,
    answers: Vec<UserAnswer>,
}

impl TryoutAttempt {
    /// # Errors
    ///
    /// Returns `BlockResultError::InvalidTimeRange` if `finished_at < started_at`.
    pub fn new(
        package_id: PackageId,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        reason: FinishReason,
        results: Vec<BlockResult>,
        mut answers: Vec<UserAnswer>,
    ) -> Result<Self, BlockResultError> {
        if finished_at < started_at {
            return Err(BlockResultError::InvalidTimeRange);
        }
        answers.sort_by_key(|a| a.question_id);
        Ok(Self {
            package_id,
            started_at,
            finished_at,
            reason,
            results,
            answers,
        })
    }

    #[must_use]
    pub fn package_id(&self) -> PackageId {
        self.package_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    #[must_use]
    pub fn reason(&self) -> FinishReason {
        self.reason
    }

    #[must_use]
    pub fn results(&self) -> &[BlockResult] {
        &self.results
    }

    /// Answers sorted by question id.
    #[must_use]
    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.results.iter().map(BlockResult::correct).sum()
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.results.iter().map(BlockResult::total_questions).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::OptionId;
    use crate::time::fixed_now;

    #[test]
    fn tabulate_counts_statuses_and_grades() {
        let now = fixed_now();
        let block = Block::new(
            BlockId::new(1),
            "Kuantitatif",
            (1..=4).map(QuestionId::new).collect(),
            20,
        )
        .unwrap();

        let mut answers = HashMap::new();
        answers.insert(
            QuestionId::new(1),
            UserAnswer::selected(QuestionId::new(1), OptionId::new(1), now),
        );
        answers.insert(
            QuestionId::new(2),
            UserAnswer::selected(QuestionId::new(2), OptionId::new(3), now),
        );
        let mut doubt_only = UserAnswer::unanswered(QuestionId::new(3), now);
        doubt_only.toggle_doubt(now);
        answers.insert(QuestionId::new(3), doubt_only);

        let mut key = AnswerKey::new();
        key.insert(QuestionId::new(1), OptionId::new(1));
        key.insert(QuestionId::new(2), OptionId::new(2));

        let result = BlockResult::tabulate(&block, &answers, &key);
        assert_eq!(result.total_questions(), 4);
        assert_eq!(result.answered(), 3);
        assert_eq!(result.blank(), 1);
        assert_eq!(result.doubtful(), 1);
        assert_eq!(result.correct(), 1);
        assert_eq!(result.incorrect(), 1);
        assert_eq!(result.answered() + result.blank(), result.total_questions());
    }

    #[test]
    fn from_persisted_rejects_inconsistent_counts() {
        let err =
            BlockResult::from_persisted(BlockId::new(1), "B".into(), 5, 3, 1, 0, 0, 0).unwrap_err();
        assert!(matches!(err, BlockResultError::CountMismatch { .. }));

        let err =
            BlockResult::from_persisted(BlockId::new(1), "B".into(), 5, 3, 2, 0, 3, 1).unwrap_err();
        assert!(matches!(err, BlockResultError::TooManyGraded { .. }));
    }

    #[test]
    fn attempt_rejects_reversed_time_range() {
        let now = fixed_now();
        let err = TryoutAttempt::new(
            PackageId::new(1),
            now,
            now - chrono::Duration::seconds(1),
            FinishReason::Manual,
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, BlockResultError::InvalidTimeRange);
    }
}
