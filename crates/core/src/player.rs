//! Tryout player state machine.
//!
//! `NotStarted → InProgress(block) → Finished`. The active block index only
//! moves forward, one block at a time; `Finished` is terminal. Every operation
//! silently ignores input that is illegal in the current state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{
    AnswerKey, AnswerStatus, Block, BlockResult, FinishReason, OptionId, PackageId, QuestionId,
    TryoutAttempt, TryoutPackage, UserAnswer,
};

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerState {
    NotStarted,
    InProgress {
        block_index: usize,
        question_index: usize,
        remaining_secs: u32,
    },
    Finished {
        reason: FinishReason,
        finished_at: DateTime<Utc>,
        results: Vec<BlockResult>,
    },
}

/// What a tick (or a manual block submit) did to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Same block, countdown decremented.
    Running { remaining_secs: u32 },
    /// Moved to the next block with a fresh countdown.
    BlockAdvanced { block_index: usize },
    /// The exam is over.
    Finished,
    /// Stale tick, not started, or already finished.
    Ignored,
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Badge of one question in the active block's navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionBadge {
    pub index: usize,
    pub question_id: QuestionId,
    pub status: AnswerStatus,
    pub is_current: bool,
}

/// Cloneable, render-ready copy of the player state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub package_id: PackageId,
    pub title: String,
    pub block_count: usize,
    pub block_index: Option<usize>,
    pub block_name: Option<String>,
    pub question_index: usize,
    pub remaining_secs: u32,
    pub current_question: Option<QuestionId>,
    pub selected_option: Option<OptionId>,
    pub current_status: AnswerStatus,
    pub badges: Vec<QuestionBadge>,
    pub is_started: bool,
    pub finish_reason: Option<FinishReason>,
    pub results: Vec<BlockResult>,
}

impl PlayerSnapshot {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finish_reason.is_some()
    }

    #[must_use]
    pub fn is_last_block(&self) -> bool {
        self.block_index.is_some_and(|i| i + 1 >= self.block_count)
    }
}

//
// ─── PLAYER ────────────────────────────────────────────────────────────────────
//

/// Owns one tryout session: the package, the answer key, the user's answers
/// and the current state.
#[derive(Debug, Clone)]
pub struct TryoutPlayer {
    package: TryoutPackage,
    key: AnswerKey,
    answers: HashMap<QuestionId, UserAnswer>,
    state: PlayerState,
    started_at: Option<DateTime<Utc>>,
}

impl TryoutPlayer {
    #[must_use]
    pub fn new(package: TryoutPackage, key: AnswerKey) -> Self {
        Self {
            package,
            key,
            answers: HashMap::new(),
            state: PlayerState::NotStarted,
            started_at: None,
        }
    }

    #[must_use]
    pub fn package(&self) -> &TryoutPackage {
        &self.package
    }

    #[must_use]
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        !matches!(self.state, PlayerState::NotStarted)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, PlayerState::Finished { .. })
    }

    #[must_use]
    pub fn active_block_index(&self) -> Option<usize> {
        match self.state {
            PlayerState::InProgress { block_index, .. } => Some(block_index),
            _ => None,
        }
    }

    #[must_use]
    pub fn active_block(&self) -> Option<&Block> {
        self.active_block_index().and_then(|i| self.package.block(i))
    }

    #[must_use]
    pub fn question_index(&self) -> Option<usize> {
        match self.state {
            PlayerState::InProgress { question_index, .. } => Some(question_index),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_question_id(&self) -> Option<QuestionId> {
        let block = self.active_block()?;
        let index = self.question_index()?;
        block.question_ids().get(index).copied()
    }

    /// Seconds left on the active block's countdown; 0 when not in progress.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        match self.state {
            PlayerState::InProgress { remaining_secs, .. } => remaining_secs,
            _ => 0,
        }
    }

    #[must_use]
    pub fn answer(&self, question_id: QuestionId) -> Option<&UserAnswer> {
        self.answers.get(&question_id)
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, UserAnswer> {
        &self.answers
    }

    #[must_use]
    pub fn status_of(&self, question_id: QuestionId) -> AnswerStatus {
        self.answers
            .get(&question_id)
            .map_or(AnswerStatus::Unanswered, |a| a.status)
    }

    /// Per-block results; empty until finished.
    #[must_use]
    pub fn results(&self) -> &[BlockResult] {
        match &self.state {
            PlayerState::Finished { results, .. } => results,
            _ => &[],
        }
    }

    #[must_use]
    pub fn finish_reason(&self) -> Option<FinishReason> {
        match &self.state {
            PlayerState::Finished { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            PlayerState::Finished { finished_at, .. } => Some(*finished_at),
            _ => None,
        }
    }

    // ─── transitions ──────────────────────────────────────────────────────────

    /// Enter the first block. A package without blocks finishes immediately.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.is_started() {
            return;
        }
        self.started_at = Some(now);
        self.enter_block(0, now, FinishReason::TimeUp);
    }

    /// One second elapsed on the countdown of `block_index`.
    pub fn tick(&mut self, block_index: usize, now: DateTime<Utc>) -> TickOutcome {
        let PlayerState::InProgress {
            block_index: active,
            remaining_secs,
            ..
        } = &mut self.state
        else {
            return TickOutcome::Ignored;
        };
        if *active != block_index {
            return TickOutcome::Ignored;
        }

        *remaining_secs = remaining_secs.saturating_sub(1);
        if *remaining_secs > 0 {
            return TickOutcome::Running {
                remaining_secs: *remaining_secs,
            };
        }

        let next = *active + 1;
        self.enter_block(next, now, FinishReason::TimeUp)
    }

    /// Close the active block early and move on.
    ///
    /// On the last block this finishes the exam with `FinishReason::Manual`.
    pub fn submit_block(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let Some(active) = self.active_block_index() else {
            return TickOutcome::Ignored;
        };
        self.enter_block(active + 1, now, FinishReason::Manual)
    }

    /// Manual finish. Returns `true` if this call ended the exam.
    pub fn finish(&mut self, now: DateTime<Utc>) -> bool {
        if self.active_block_index().is_none() {
            return false;
        }
        self.finish_with(FinishReason::Manual, now);
        true
    }

    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        option_id: OptionId,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.is_in_active_block(question_id) {
            return false;
        }
        self.answers
            .entry(question_id)
            .and_modify(|a| a.select(option_id, now))
            .or_insert_with(|| UserAnswer::selected(question_id, option_id, now));
        true
    }

    pub fn toggle_doubt(&mut self, question_id: QuestionId, now: DateTime<Utc>) -> bool {
        if !self.is_in_active_block(question_id) {
            return false;
        }
        self.answers
            .entry(question_id)
            .or_insert_with(|| UserAnswer::unanswered(question_id, now))
            .toggle_doubt(now);
        true
    }

    /// Jump inside the active block. Out-of-range indices are ignored.
    pub fn go_to_question(&mut self, index: usize) -> bool {
        let len = self.active_block().map_or(0, Block::len);
        match &mut self.state {
            PlayerState::InProgress { question_index, .. } if index < len => {
                *question_index = index;
                true
            }
            _ => false,
        }
    }

    pub fn next_question(&mut self) -> bool {
        self.question_index().is_some_and(|i| self.go_to_question(i + 1))
    }

    pub fn previous_question(&mut self) -> bool {
        match self.question_index() {
            Some(i) if i > 0 => self.go_to_question(i - 1),
            _ => false,
        }
    }

    /// Package the finished session for persistence.
    ///
    /// A wall clock stepping backwards can put the finish before the start;
    /// the start is clamped so a finished session always yields an attempt.
    #[must_use]
    pub fn attempt(&self) -> Option<TryoutAttempt> {
        let PlayerState::Finished {
            reason,
            finished_at,
            results,
        } = &self.state
        else {
            return None;
        };
        let started_at = self
            .started_at
            .map_or(*finished_at, |at| at.min(*finished_at));
        TryoutAttempt::new(
            self.package.id(),
            started_at,
            *finished_at,
            *reason,
            results.clone(),
            self.answers.values().cloned().collect(),
        )
        .ok()
    }

    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        let block = self.active_block();
        let question_index = self.question_index().unwrap_or(0);
        let current_question = self.current_question_id();

        let badges = block.map_or_else(Vec::new, |b| {
            b.question_ids()
                .iter()
                .enumerate()
                .map(|(index, id)| QuestionBadge {
                    index,
                    question_id: *id,
                    status: self.status_of(*id),
                    is_current: index == question_index,
                })
                .collect()
        });

        PlayerSnapshot {
            package_id: self.package.id(),
            title: self.package.title().to_owned(),
            block_count: self.package.block_count(),
            block_index: self.active_block_index(),
            block_name: block.map(|b| b.name().to_owned()),
            question_index,
            remaining_secs: self.remaining_secs(),
            current_question,
            selected_option: current_question
                .and_then(|id| self.answers.get(&id))
                .and_then(|a| a.selected_option),
            current_status: current_question
                .map_or(AnswerStatus::Unanswered, |id| self.status_of(id)),
            badges,
            is_started: self.is_started(),
            finish_reason: self.finish_reason(),
            results: self.results().to_vec(),
        }
    }

    // ─── internals ────────────────────────────────────────────────────────────

    fn is_in_active_block(&self, question_id: QuestionId) -> bool {
        self.active_block().is_some_and(|b| b.contains(question_id))
    }

    /// Activate `index` with a fresh countdown, or finish if it is past the end.
    fn enter_block(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
        reason_if_last: FinishReason,
    ) -> TickOutcome {
        match self.package.block(index) {
            Some(block) => {
                self.state = PlayerState::InProgress {
                    block_index: index,
                    question_index: 0,
                    remaining_secs: block.duration_secs(),
                };
                TickOutcome::BlockAdvanced { block_index: index }
            }
            None => {
                self.finish_with(reason_if_last, now);
                TickOutcome::Finished
            }
        }
    }

    fn finish_with(&mut self, reason: FinishReason, now: DateTime<Utc>) {
        let results = self
            .package
            .blocks()
            .iter()
            .map(|b| BlockResult::tabulate(b, &self.answers, &self.key))
            .collect();
        self.state = PlayerState::Finished {
            reason,
            finished_at: now,
            results,
        };
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockId, PackageId};
    use crate::time::fixed_now;

    fn package(blocks: &[(&[u64], u32)]) -> TryoutPackage {
        let blocks = blocks
            .iter()
            .enumerate()
            .map(|(i, (ids, minutes))| {
                Block::new(
                    BlockId::new(i as u64 + 1),
                    format!("Block {}", i + 1),
                    ids.iter().copied().map(QuestionId::new).collect(),
                    *minutes,
                )
                .unwrap()
            })
            .collect();
        TryoutPackage::new(PackageId::new(1), "Tryout SNBT", blocks).unwrap()
    }

    fn started(blocks: &[(&[u64], u32)]) -> TryoutPlayer {
        let mut player = TryoutPlayer::new(package(blocks), AnswerKey::new());
        player.start(fixed_now());
        player
    }

    fn run_out_block(player: &mut TryoutPlayer) -> TickOutcome {
        let index = player.active_block_index().unwrap();
        loop {
            match player.tick(index, fixed_now()) {
                TickOutcome::Running { .. } => {}
                other => return other,
            }
        }
    }

    #[test]
    fn start_enters_first_block_with_full_countdown() {
        let player = started(&[(&[1, 2], 2), (&[3], 1)]);
        assert_eq!(player.active_block_index(), Some(0));
        assert_eq!(player.remaining_secs(), 120);
        assert_eq!(player.current_question_id(), Some(QuestionId::new(1)));
    }

    #[test]
    fn empty_package_finishes_on_start() {
        let mut player = TryoutPlayer::new(
            TryoutPackage::new(PackageId::new(1), "Empty", Vec::new()).unwrap(),
            AnswerKey::new(),
        );
        player.start(fixed_now());
        assert!(player.is_finished());
        assert!(player.results().is_empty());
    }

    #[test]
    fn timeout_advances_block_and_keeps_answers() {
        let mut player = started(&[(&[1], 1), (&[2], 1)]);
        assert!(player.select_answer(QuestionId::new(1), OptionId::new(2), fixed_now()));
        let before = player.answer(QuestionId::new(1)).cloned();

        for _ in 0..59 {
            assert!(matches!(
                player.tick(0, fixed_now()),
                TickOutcome::Running { .. }
            ));
        }
        assert_eq!(
            player.tick(0, fixed_now()),
            TickOutcome::BlockAdvanced { block_index: 1 }
        );
        assert_eq!(player.active_block_index(), Some(1));
        assert_eq!(player.remaining_secs(), 60);
        assert_eq!(player.question_index(), Some(0));
        assert_eq!(player.answer(QuestionId::new(1)).cloned(), before);
    }

    #[test]
    fn last_block_timeout_finishes_with_results_per_block() {
        let mut player = started(&[(&[1, 2], 1), (&[3, 4, 5], 1)]);
        player.select_answer(QuestionId::new(1), OptionId::new(1), fixed_now());
        run_out_block(&mut player);
        player.toggle_doubt(QuestionId::new(4), fixed_now());
        assert_eq!(run_out_block(&mut player), TickOutcome::Finished);

        assert!(player.is_finished());
        assert_eq!(player.finish_reason(), Some(FinishReason::TimeUp));
        let results = player.results();
        assert_eq!(results.len(), 2);
        for r in results {
            assert_eq!(r.answered() + r.blank(), r.total_questions());
        }
        assert_eq!(results[0].answered(), 1);
        assert_eq!(results[1].doubtful(), 1);
    }

    #[test]
    fn untouched_exam_is_all_blank() {
        let mut player = started(&[(&[1, 2], 1), (&[3], 2)]);
        run_out_block(&mut player);
        run_out_block(&mut player);
        assert!(player.is_finished());
        for r in player.results() {
            assert_eq!(r.blank(), r.total_questions());
        }
    }

    #[test]
    fn stale_and_post_finish_ticks_are_ignored() {
        let mut player = started(&[(&[1], 1), (&[2], 1)]);
        run_out_block(&mut player);
        assert_eq!(player.tick(0, fixed_now()), TickOutcome::Ignored);
        assert_eq!(player.remaining_secs(), 60);

        assert!(player.finish(fixed_now()));
        assert_eq!(player.tick(1, fixed_now()), TickOutcome::Ignored);
        assert!(!player.finish(fixed_now()));
        assert_eq!(player.finish_reason(), Some(FinishReason::Manual));
    }

    #[test]
    fn finish_before_start_still_yields_attempt() {
        let mut player = started(&[(&[1, 2], 1)]);
        player.select_answer(QuestionId::new(1), OptionId::new(1), fixed_now());
        let finished_at = fixed_now() - chrono::Duration::seconds(1);
        assert!(player.finish(finished_at));

        let attempt = player.attempt().expect("finished player yields an attempt");
        assert_eq!(attempt.started_at(), finished_at);
        assert_eq!(attempt.finished_at(), finished_at);
        assert_eq!(attempt.answers().len(), 1);
    }

    #[test]
    fn mutations_after_finish_are_ignored() {
        let mut player = started(&[(&[1, 2], 1)]);
        player.finish(fixed_now());
        let snapshot = player.snapshot();

        assert!(!player.select_answer(QuestionId::new(1), OptionId::new(1), fixed_now()));
        assert!(!player.toggle_doubt(QuestionId::new(1), fixed_now()));
        assert!(!player.go_to_question(1));
        assert_eq!(player.submit_block(fixed_now()), TickOutcome::Ignored);
        assert_eq!(player.snapshot(), snapshot);
    }

    #[test]
    fn navigation_stays_inside_active_block() {
        let mut player = started(&[(&[1, 2, 3], 1), (&[4], 1)]);
        assert!(player.go_to_question(2));
        assert!(!player.go_to_question(3));
        assert_eq!(player.question_index(), Some(2));
        assert!(!player.next_question());
        assert!(player.previous_question());
        assert_eq!(player.current_question_id(), Some(QuestionId::new(2)));

        // Questions of other blocks are not answerable from here.
        assert!(!player.select_answer(QuestionId::new(4), OptionId::new(1), fixed_now()));
    }

    #[test]
    fn empty_block_has_no_current_question() {
        let mut player = started(&[(&[], 1), (&[1], 1)]);
        assert_eq!(player.current_question_id(), None);
        assert!(!player.go_to_question(0));
        assert_eq!(
            player.submit_block(fixed_now()),
            TickOutcome::BlockAdvanced { block_index: 1 }
        );
    }

    #[test]
    fn block_index_never_decreases() {
        let mut player = started(&[(&[1], 1), (&[2], 1), (&[3], 1)]);
        let mut last = 0;
        while let Some(index) = player.active_block_index() {
            assert!(index >= last);
            last = index;
            player.go_to_question(0);
            player.submit_block(fixed_now());
        }
        assert_eq!(last, 2);
        assert_eq!(player.finish_reason(), Some(FinishReason::Manual));
    }

    #[test]
    fn doubt_without_answer_then_answer_becomes_answered() {
        let mut player = started(&[(&[1], 1)]);
        player.toggle_doubt(QuestionId::new(1), fixed_now());
        assert_eq!(player.status_of(QuestionId::new(1)), AnswerStatus::Doubtful);
        player.select_answer(QuestionId::new(1), OptionId::new(3), fixed_now());
        assert_eq!(player.status_of(QuestionId::new(1)), AnswerStatus::Answered);
    }

    #[test]
    fn doubt_toggle_twice_restores_status() {
        let mut player = started(&[(&[1, 2], 1)]);
        player.select_answer(QuestionId::new(1), OptionId::new(3), fixed_now());
        player.toggle_doubt(QuestionId::new(1), fixed_now());
        player.toggle_doubt(QuestionId::new(1), fixed_now());
        assert_eq!(player.status_of(QuestionId::new(1)), AnswerStatus::Answered);

        player.toggle_doubt(QuestionId::new(2), fixed_now());
        player.toggle_doubt(QuestionId::new(2), fixed_now());
        assert_eq!(player.status_of(QuestionId::new(2)), AnswerStatus::Unanswered);
    }

    #[test]
    fn results_grade_with_answer_key() {
        let mut key = AnswerKey::new();
        key.insert(QuestionId::new(1), OptionId::new(2));
        key.insert(QuestionId::new(2), OptionId::new(4));
        let mut player = TryoutPlayer::new(package(&[(&[1, 2], 1)]), key);
        player.start(fixed_now());
        player.select_answer(QuestionId::new(1), OptionId::new(2), fixed_now());
        player.select_answer(QuestionId::new(2), OptionId::new(2), fixed_now());
        player.finish(fixed_now());

        let result = &player.results()[0];
        assert_eq!(result.correct(), 1);
        assert_eq!(result.incorrect(), 1);

        let attempt = player.attempt().unwrap();
        assert_eq!(attempt.total_correct(), 1);
        assert_eq!(attempt.answers().len(), 2);
    }

    #[test]
    fn snapshot_marks_current_and_statuses() {
        let mut player = started(&[(&[1, 2, 3], 1)]);
        player.select_answer(QuestionId::new(1), OptionId::new(1), fixed_now());
        player.toggle_doubt(QuestionId::new(2), fixed_now());
        player.go_to_question(1);

        let snap = player.snapshot();
        assert_eq!(snap.block_name.as_deref(), Some("Block 1"));
        assert!(snap.is_last_block());
        assert_eq!(snap.current_question, Some(QuestionId::new(2)));
        assert_eq!(snap.current_status, AnswerStatus::Doubtful);
        let statuses: Vec<_> = snap.badges.iter().map(|b| b.status).collect();
        assert_eq!(
            statuses,
            vec![
                AnswerStatus::Answered,
                AnswerStatus::Doubtful,
                AnswerStatus::Unanswered
            ]
        );
        assert!(snap.badges[1].is_current);
    }
}
