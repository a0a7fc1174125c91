//! Per-block countdown task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval between two countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owns the tokio task counting down one block.
///
/// The task is aborted on [`CountdownHandle::cancel`] and on drop, so a
/// handle going out of scope never leaves a timer running.
#[derive(Debug)]
pub struct CountdownHandle {
    block_index: usize,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Spawn a countdown for `block_index` on the current tokio runtime.
    ///
    /// `on_tick` runs once per `period`, starting one period after spawn, and
    /// receives the block index the countdown is bound to. Returning `false`
    /// stops the task.
    pub fn spawn<F>(block_index: usize, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(usize) -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !on_tick(block_index) {
                    break;
                }
            }
        });
        Self { block_index, task }
    }

    #[must_use]
    pub fn block_index(&self) -> usize {
        self.block_index
    }

    /// `true` once the task has stopped or was aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
