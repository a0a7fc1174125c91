use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tryout_core::model::{OptionId, PackageId, Question, QuestionId, TryoutAttempt};
use tryout_core::{PlayerSnapshot, TickOutcome, TryoutPlayer};

use storage::repository::AttemptId;

use super::timer::CountdownHandle;
use crate::Clock;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    clock: Clock,
    period: Duration,
    player: Mutex<TryoutPlayer>,
    countdown: Mutex<Option<CountdownHandle>>,
    snapshots: watch::Sender<PlayerSnapshot>,
}

impl Shared {
    /// Apply `f` to the player, then publish a snapshot and bring the
    /// countdown in line with the active block. The player lock is held
    /// throughout so concurrent transitions cannot install stale timers.
    fn transition<R>(self: &Arc<Self>, f: impl FnOnce(&mut TryoutPlayer) -> R) -> R {
        let mut player = lock(&self.player);
        let out = f(&mut player);
        self.sync_countdown(&player);
        self.snapshots.send_replace(player.snapshot());
        out
    }

    fn sync_countdown(self: &Arc<Self>, player: &TryoutPlayer) {
        let wanted = player.active_block_index();
        let mut slot = lock(&self.countdown);
        if slot.as_ref().map(CountdownHandle::block_index) == wanted {
            return;
        }
        // Dropping the previous handle aborts its task.
        *slot = wanted.map(|block_index| self.spawn_countdown(block_index));
    }

    fn spawn_countdown(self: &Arc<Self>, block_index: usize) -> CountdownHandle {
        let weak: Weak<Self> = Arc::downgrade(self);
        CountdownHandle::spawn(block_index, self.period, move |block_index| {
            weak.upgrade()
                .is_some_and(|shared| shared.on_tick(block_index))
        })
    }

    fn on_tick(self: &Arc<Self>, block_index: usize) -> bool {
        let now = self.clock.now();
        let outcome = self.transition(|player| player.tick(block_index, now));
        match outcome {
            TickOutcome::Running { .. } => true,
            TickOutcome::BlockAdvanced { block_index: next } => {
                log::info!("block {block_index} timed out, advanced to block {next}");
                false
            }
            TickOutcome::Finished => {
                log::info!("last block {block_index} timed out, tryout finished");
                false
            }
            TickOutcome::Ignored => {
                log::debug!("ignored stale tick for block {block_index}");
                false
            }
        }
    }
}

/// A live tryout: the player, its countdown and the question bank.
///
/// Dropping the run cancels the countdown.
pub struct TryoutRun {
    shared: Arc<Shared>,
    questions: HashMap<QuestionId, Question>,
    attempt_id: Mutex<Option<AttemptId>>,
    persisting: tokio::sync::Mutex<()>,
}

impl TryoutRun {
    /// Start `player` and its first countdown. Must be called inside a tokio
    /// runtime.
    pub(crate) fn start(
        mut player: TryoutPlayer,
        questions: Vec<Question>,
        clock: Clock,
        period: Duration,
    ) -> Self {
        player.start(clock.now());
        let (snapshots, _) = watch::channel(player.snapshot());
        let shared = Arc::new(Shared {
            clock,
            period,
            player: Mutex::new(player),
            countdown: Mutex::new(None),
            snapshots,
        });
        shared.transition(|_| ());

        Self {
            shared,
            questions: questions.into_iter().map(|q| (q.id(), q)).collect(),
            attempt_id: Mutex::new(None),
            persisting: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn package_id(&self) -> PackageId {
        lock(&self.shared.player).package().id()
    }

    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Question bank lookup. `None` when the bank lacks the question.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        lock(&self.shared.player).is_finished()
    }

    /// Block index the running countdown is bound to.
    #[must_use]
    pub fn countdown_block(&self) -> Option<usize> {
        lock(&self.shared.countdown).as_ref().map(CountdownHandle::block_index)
    }

    pub fn select_answer(&self, question_id: QuestionId, option_id: OptionId) -> bool {
        let now = self.shared.clock.now();
        self.shared
            .transition(|p| p.select_answer(question_id, option_id, now))
    }

    pub fn toggle_doubt(&self, question_id: QuestionId) -> bool {
        let now = self.shared.clock.now();
        self.shared.transition(|p| p.toggle_doubt(question_id, now))
    }

    pub fn go_to_question(&self, index: usize) -> bool {
        self.shared.transition(|p| p.go_to_question(index))
    }

    pub fn next_question(&self) -> bool {
        self.shared.transition(TryoutPlayer::next_question)
    }

    pub fn previous_question(&self) -> bool {
        self.shared.transition(TryoutPlayer::previous_question)
    }

    /// Close `block_index` early. Ignored when that block is no longer
    /// active, so a submit racing a timeout never skips the next block.
    pub fn submit_block(&self, block_index: usize) -> TickOutcome {
        let now = self.shared.clock.now();
        let outcome = self.shared.transition(|p| {
            if p.active_block_index() == Some(block_index) {
                p.submit_block(now)
            } else {
                TickOutcome::Ignored
            }
        });
        match outcome {
            TickOutcome::BlockAdvanced { block_index: next } => {
                log::info!("block {block_index} submitted, advanced to block {next}");
            }
            TickOutcome::Finished => log::info!("last block submitted, tryout finished"),
            _ => {}
        }
        outcome
    }

    /// Manual finish without persisting. Returns `true` if this call ended
    /// the exam.
    pub fn finish(&self) -> bool {
        let now = self.shared.clock.now();
        let finished = self.shared.transition(|p| p.finish(now));
        if finished {
            log::info!("tryout finished manually");
        }
        finished
    }

    /// The finished attempt, `None` while still running.
    #[must_use]
    pub fn attempt(&self) -> Option<TryoutAttempt> {
        lock(&self.shared.player).attempt()
    }

    /// Storage id once the attempt has been persisted.
    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        *lock(&self.attempt_id)
    }

    pub(crate) fn set_attempt_id(&self, id: AttemptId) {
        *lock(&self.attempt_id) = Some(id);
    }

    /// Serializes persistence so an attempt is appended at most once.
    pub(crate) async fn persist_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.persisting.lock().await
    }
}

impl Drop for TryoutRun {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.shared.countdown).take() {
            handle.cancel();
        }
    }
}

impl std::fmt::Debug for TryoutRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryoutRun")
            .field("snapshot", &self.snapshot())
            .field("attempt_id", &self.attempt_id())
            .finish_non_exhaustive()
    }
}
