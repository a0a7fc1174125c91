use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{BlockId, PackageId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PackageError {
    #[error("package title cannot be empty")]
    EmptyTitle,

    #[error("block name cannot be empty")]
    EmptyBlockName,

    #[error("duplicate block id: {0}")]
    DuplicateBlock(BlockId),

    #[error("question {0} appears more than once in the package")]
    DuplicateQuestion(QuestionId),
}

//
// ─── BLOCK ─────────────────────────────────────────────────────────────────────
//

/// A timed, ordered subset of a tryout's questions.
///
/// Blocks are worked strictly in order; the duration is configured in whole minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    name: String,
    question_ids: Vec<QuestionId>,
    duration_minutes: u32,
}

impl Block {
    /// Creates a block.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::EmptyBlockName` if the trimmed name is empty.
    pub fn new(
        id: BlockId,
        name: impl Into<String>,
        question_ids: Vec<QuestionId>,
        duration_minutes: u32,
    ) -> Result<Self, PackageError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(PackageError::EmptyBlockName);
        }
        Ok(Self {
            id,
            name,
            question_ids,
            duration_minutes,
        })
    }

    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.question_ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.question_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, question_id: QuestionId) -> bool {
        self.question_ids.contains(&question_id)
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Countdown length for this block.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }
}

//
// ─── PACKAGE ───────────────────────────────────────────────────────────────────
//

/// A full mock exam: an ordered list of timed blocks.
///
/// Immutable once built. Every question belongs to exactly one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryoutPackage {
    id: PackageId,
    title: String,
    blocks: Vec<Block>,
}

impl TryoutPackage {
    /// Creates a package and checks block/question uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::EmptyTitle` for a blank title,
    /// `PackageError::DuplicateBlock` if two blocks share an id, and
    /// `PackageError::DuplicateQuestion` if a question appears more than once.
    pub fn new(
        id: PackageId,
        title: impl Into<String>,
        blocks: Vec<Block>,
    ) -> Result<Self, PackageError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(PackageError::EmptyTitle);
        }

        let mut block_ids = HashSet::with_capacity(blocks.len());
        let mut seen = HashSet::new();
        for block in &blocks {
            if !block_ids.insert(block.id()) {
                return Err(PackageError::DuplicateBlock(block.id()));
            }
            for question_id in block.question_ids() {
                if !seen.insert(*question_id) {
                    return Err(PackageError::DuplicateQuestion(*question_id));
                }
            }
        }

        Ok(Self { id, title, blocks })
    }

    #[must_use]
    pub fn id(&self) -> PackageId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Sum of all block durations, in minutes.
    #[must_use]
    pub fn total_minutes(&self) -> u32 {
        self.blocks
            .iter()
            .fold(0_u32, |acc, b| acc.saturating_add(b.duration_minutes()))
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// All question ids in block order.
    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.blocks
            .iter()
            .flat_map(|b| b.question_ids().iter().copied())
    }

    /// Index of the block owning `question_id`.
    #[must_use]
    pub fn block_index_of(&self, question_id: QuestionId) -> Option<usize> {
        self.blocks.iter().position(|b| b.contains(question_id))
    }
}
