//! Deferred execution of transitions.
//!
//! The machine never sleeps or spawns on its own. Transitions declared with
//! [`Delay::NextTick`](crate::core::Delay::NextTick) or
//! [`Delay::After`](crate::core::Delay::After) are handed to an injected
//! [`Scheduler`]. Scheduling is fire-and-forget: there is no handle to cancel
//! a pending task.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Capability to run work later.
pub trait Scheduler: Send + Sync {
    /// Run `task` on the next tick, after the current call stack unwinds.
    fn next_tick(&self, task: Task);

    /// Run `task` once `delay` has elapsed.
    fn after(&self, delay: Duration, task: Task);
}

struct Timer {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct Queue {
    now: Duration,
    seq: u64,
    ticks: VecDeque<Task>,
    timers: Vec<Timer>,
}

/// Deterministic scheduler driven by hand, with a virtual clock.
///
/// Nothing runs until the owner calls [`run_ticks`](Self::run_ticks),
/// [`advance`](Self::advance) or [`run_until_idle`](Self::run_until_idle).
/// Tasks may schedule more tasks while running.
///
/// ```rust
/// use statepath::effects::{ManualScheduler, Scheduler};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&fired);
/// scheduler.after(Duration::from_millis(50), Box::new(move || flag.store(true, Ordering::SeqCst)));
///
/// scheduler.advance(Duration::from_millis(49));
/// assert!(!fired.load(Ordering::SeqCst));
/// scheduler.advance(Duration::from_millis(1));
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Queue>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed so far.
    pub fn now(&self) -> Duration {
        self.queue.lock().now
    }

    /// Number of queued ticks and timers.
    pub fn pending(&self) -> usize {
        let queue = self.queue.lock();
        queue.ticks.len() + queue.timers.len()
    }

    /// Run the ticks queued so far. Ticks queued while running wait for the
    /// next call. Returns how many ran.
    pub fn run_ticks(&self) -> usize {
        let batch: Vec<Task> = self.queue.lock().ticks.drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    /// Move the clock forward by `by`, running ticks first and then every
    /// timer that falls due, in due order. Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let mut ran = self.run_ticks();
        let target = self.queue.lock().now + by;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
            ran += self.run_ticks();
        }
        self.queue.lock().now = target;
        ran
    }

    /// Run ticks and timers, jumping the clock, until nothing is queued.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            ran += self.run_ticks();
            let next_due = {
                let queue = self.queue.lock();
                if !queue.ticks.is_empty() {
                    continue;
                }
                queue.timers.iter().map(|t| t.due).min()
            };
            match next_due {
                Some(due) => {
                    let now = self.now();
                    ran += self.advance(due.saturating_sub(now));
                }
                None => return ran,
            }
        }
    }

    fn pop_due(&self, limit: Duration) -> Option<Task> {
        let mut queue = self.queue.lock();
        let index = queue
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= limit)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        let timer = queue.timers.swap_remove(index);
        queue.now = queue.now.max(timer.due);
        Some(timer.task)
    }
}

impl Scheduler for ManualScheduler {
    fn next_tick(&self, task: Task) {
        self.queue.lock().ticks.push_back(task);
    }

    fn after(&self, delay: Duration, task: Task) {
        let mut queue = self.queue.lock();
        let due = queue.now + delay;
        let seq = queue.seq;
        queue.seq += 1;
        queue.timers.push(Timer { due, seq, task });
    }
}

/// Scheduler backed by a tokio runtime.
///
/// Ticks are spawned tasks that yield once; timers sleep on the runtime
/// clock. Must be created inside a runtime (or from an explicit handle).
#[cfg(feature = "tokio")]
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioScheduler {
    /// Capture the current runtime.
    ///
    /// Panics outside a tokio runtime, like `Handle::current`.
    pub fn current() -> Self {
        Self::from_handle(tokio::runtime::Handle::current())
    }

    /// Use an explicit runtime handle.
    pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    fn next_tick(&self, task: Task) {
        self.handle.spawn(async move {
            tokio::task::yield_now().await;
            task();
        });
    }

    fn after(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}
