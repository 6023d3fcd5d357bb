use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;

use super::clock::{Clock, ManualClock};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Defers a callback by a duration.
///
/// Implementations must never run the callback synchronously from inside
/// `after`; callers arm timers while holding their own locks.
pub trait Scheduler: Send + Sync {
    fn after(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Cancels a pending callback. Dropping the handle leaves the timer armed.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

// Runs callbacks on a tokio runtime after a sleep
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    // Panics outside a tokio runtime, same as Handle::current
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, task: Task) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TimerHandle::new(move || join.abort())
    }
}

struct Pending {
    id: u64,
    due: i64,
    task: Task,
}

#[derive(Default)]
struct Queue {
    next_id: u64,
    pending: Vec<Pending>,
}

/// Scheduler driven by a [`ManualClock`]: nothing fires until `advance`.
///
/// Callbacks due at the same instant run in the order they were scheduled,
/// and the clock reads each callback's due time while it runs.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    queue: Arc<Mutex<Queue>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            queue: Arc::new(Mutex::new(Queue::default())),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.pending.len()).unwrap_or(0)
    }

    // Move the clock forward, firing everything that comes due on the way
    pub fn advance(&self, by: Duration) {
        let target = self.clock.now_millis() + by.as_millis() as i64;
        while let Some(next) = self.pop_due(target) {
            if next.due > self.clock.now_millis() {
                self.clock.set(next.due);
            }
            (next.task)();
        }
        if target > self.clock.now_millis() {
            self.clock.set(target);
        }
    }

    fn pop_due(&self, target: i64) -> Option<Pending> {
        let mut queue = self.queue.lock().ok()?;
        let idx = queue
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(idx, _)| idx)?;
        Some(queue.pending.remove(idx))
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, task: Task) -> TimerHandle {
        // round up so a sub-millisecond delay still lands in the future
        let due = self.clock.now_millis() + delay.as_micros().div_ceil(1000) as i64;
        let Ok(mut queue) = self.queue.lock() else {
            return TimerHandle::new(|| {});
        };
        let id = queue.next_id;
        queue.next_id += 1;
        queue.pending.push(Pending { id, due, task });

        let weak = Arc::downgrade(&self.queue);
        TimerHandle::new(move || {
            if let Some(queue) = weak.upgrade() {
                if let Ok(mut queue) = queue.lock() {
                    queue.pending.retain(|p| p.id != id);
                }
            }
        })
    }
}
