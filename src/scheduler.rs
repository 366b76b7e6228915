//! Delayed task scheduling
//!
//! The engine never sleeps itself; it hands delayed continuations to a
//! [`Scheduler`]. Production code uses [`TokioScheduler`]; tests drive a
//! [`ManualScheduler`] whose clock only moves when told to.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

/// A continuation to run later
pub type Task = BoxFuture<'static, ()>;

/// Runs tasks after a delay.
///
/// A zero delay still defers the task to a later tick; it never runs inline.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: Task);
}

/// Scheduler that spawns onto the current tokio runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
    }
}

struct Pending {
    due: Duration,
    sequence: u64,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_sequence: u64,
    pending: Vec<Pending>,
}

/// Virtual-time scheduler.
///
/// Tasks run only from [`ManualScheduler::advance`], in due order, ties broken
/// by scheduling order.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// Create a scheduler at virtual time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Move the clock forward by `by` and run every task that became due,
    /// including tasks scheduled by those tasks. Returns how many ran.
    pub async fn advance(&self, by: Duration) -> usize {
        let target = {
            let mut state = self.state.lock();
            state.now += by;
            state.now
        };

        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            task.await;
            ran += 1;
        }
        debug!("Advanced virtual clock to {:?}, ran {} task(s)", target, ran);
        ran
    }

    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.state.lock();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.sequence))
            .map(|(i, _)| i)?;
        Some(state.pending.swap_remove(index).task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.state.lock();
        let due = state.now + delay;
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.pending.push(Pending {
            due,
            sequence,
            task,
        });
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |label: &'static str| -> Task {
            let sink = Arc::clone(&sink);
            Box::pin(async move { sink.lock().push(label) })
        };
        (log, make)
    }

    #[tokio::test]
    async fn test_manual_scheduler_runs_only_due_tasks() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_millis(100), task("late"));
        scheduler.schedule(Duration::ZERO, task("now"));
        assert_eq!(scheduler.pending(), 2);
        assert!(log.lock().is_empty());

        assert_eq!(scheduler.advance(Duration::ZERO).await, 1);
        assert_eq!(*log.lock(), vec!["now"]);

        assert_eq!(scheduler.advance(Duration::from_millis(99)).await, 0);
        assert_eq!(scheduler.advance(Duration::from_millis(1)).await, 1);
        assert_eq!(*log.lock(), vec!["now", "late"]);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_manual_scheduler_orders_by_due_then_sequence() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_millis(20), task("b"));
        scheduler.schedule(Duration::from_millis(10), task("a"));
        scheduler.schedule(Duration::from_millis(20), task("c"));

        assert_eq!(scheduler.advance(Duration::from_secs(1)).await, 3);
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_manual_scheduler_runs_tasks_scheduled_by_tasks() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (log, task) = recorder();

        let inner = Arc::clone(&scheduler);
        let follow_up = task("follow-up");
        scheduler.schedule(
            Duration::ZERO,
            Box::pin(async move { inner.schedule(Duration::ZERO, follow_up) }),
        );

        assert_eq!(scheduler.advance(Duration::ZERO).await, 2);
        assert_eq!(*log.lock(), vec!["follow-up"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_waits_for_delay() {
        let (log, task) = recorder();

        TokioScheduler.schedule(Duration::from_secs(5), task("fired"));
        tokio::task::yield_now().await;
        assert!(log.lock().is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(*log.lock(), vec!["fired"]);
    }
}
