use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;

use super::clock::Clock;
use super::scheduler::{Scheduler, TimerHandle};
use super::storage::Storage;
use crate::metrics::{BLOCKED_ACTIONS, COOLDOWN_ACTIVE, RATE_LIMIT_REPORTS};
use crate::notify::{Notice, Notifier, RATE_LIMIT_SLOT, remaining_seconds};

/// Length of every cooldown. The remote API sends no reset hint.
pub const COOLDOWN: Duration = Duration::from_secs(60);

/// Storage key holding the reset instant in epoch milliseconds.
pub const STORAGE_KEY: &str = "rateLimitResetTime";

// Point-in-time view of the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub is_limited: bool,
    pub reset_at: Option<i64>,
    pub remaining_seconds: u64,
}

#[derive(Default)]
struct GuardState {
    reset_at: Option<i64>,
    // bumped on every Idle -> Limited so a stale timer can tell it is stale
    epoch: u64,
    timer: Option<TimerHandle>,
}

struct Inner {
    state: Mutex<GuardState>,
    storage: Arc<dyn Storage>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

/// Process-wide "are we being throttled" switch.
///
/// Construct one at startup and hand clones to every call site that talks to
/// the remote API. Call sites ask [`check`](Self::check) before sending and
/// [`report`](Self::report) when a response says they were throttled; the
/// guard then blocks for [`COOLDOWN`], remembers the deadline in storage so a
/// restart keeps honouring it, and lets go on its own once the deadline passes.
///
/// Nothing here returns an error. Storage failures downgrade the guard to
/// memory-only for the life of the process.
#[derive(Clone)]
pub struct RateLimitGuard {
    inner: Arc<Inner>,
}

impl RateLimitGuard {
    /// Builds the guard and restores a cooldown persisted by an earlier run.
    pub fn init(
        storage: Arc<dyn Storage>,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let guard = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(GuardState::default()),
                storage,
                scheduler,
                clock,
                notifier,
            }),
        };
        guard.restore();
        guard
    }

    pub fn is_limited(&self) -> bool {
        self.lock().reset_at.is_some()
    }

    pub fn reset_at(&self) -> Option<i64> {
        self.lock().reset_at
    }

    pub fn state(&self) -> RateLimitState {
        let reset_at = self.reset_at();
        RateLimitState {
            is_limited: reset_at.is_some(),
            reset_at,
            remaining_seconds: reset_at
                .map(|t| remaining_seconds(t, self.inner.clock.now_millis()))
                .unwrap_or(0),
        }
    }

    /// Returns true when the caller must not send its request.
    ///
    /// A blocked caller also re-raises the rate-limit notice so the user sees
    /// why nothing happened.
    pub fn check(&self) -> bool {
        self.blocked_until().is_some()
    }

    /// Like [`check`](Self::check), but hands back the deadline that blocked
    /// the caller.
    pub fn blocked_until(&self) -> Option<i64> {
        let state = self.lock();
        let reset_at = state.reset_at?;
        BLOCKED_ACTIONS.inc();
        log::debug!("action blocked, cooldown ends at {}", reset_at);
        self.inner
            .notifier
            .show(RATE_LIMIT_SLOT, Notice::StillActive { reset_at });
        Some(reset_at)
    }

    /// Enters the cooldown. A no-op while a cooldown is already running.
    pub fn report(&self) {
        let mut state = self.lock();
        if let Some(existing) = state.reset_at {
            log::debug!("rate limit already reported, cooldown ends at {}", existing);
            return;
        }

        let reset_at = self.inner.clock.now_millis() + COOLDOWN.as_millis() as i64;
        self.enter(&mut state, reset_at, COOLDOWN);
        self.persist(reset_at);

        RATE_LIMIT_REPORTS.inc();
        log::info!(
            "rate limited by remote API, blocking requests for {}s",
            COOLDOWN.as_secs()
        );
        self.inner
            .notifier
            .show(RATE_LIMIT_SLOT, Notice::LimitEntered { reset_at });
    }

    fn restore(&self) {
        let stored = match self.inner.storage.get(STORAGE_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("rate limit storage unavailable, keeping state in memory: {}", e);
                return;
            }
        };
        let Some(raw) = stored else {
            return;
        };

        let now = self.inner.clock.now_millis();
        match raw.trim().parse::<i64>() {
            Ok(reset_at) if reset_at > now => {
                let mut state = self.lock();
                let remaining = Duration::from_millis((reset_at - now) as u64);
                self.enter(&mut state, reset_at, remaining);
                log::info!(
                    "restored rate limit cooldown, {}s left",
                    remaining_seconds(reset_at, now)
                );
                self.inner
                    .notifier
                    .show(RATE_LIMIT_SLOT, Notice::LimitEntered { reset_at });
            }
            _ => {
                log::debug!("discarding stale rate limit entry {:?}", raw);
                self.forget();
            }
        }
    }

    // Idle -> Limited, with the expiry timer armed
    fn enter(&self, state: &mut GuardState, reset_at: i64, delay: Duration) {
        state.epoch += 1;
        state.reset_at = Some(reset_at);
        state.timer = Some(self.arm(delay, state.epoch));
        COOLDOWN_ACTIVE.set(1.0);
    }

    fn arm(&self, delay: Duration, epoch: u64) -> TimerHandle {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .after(delay, Box::new(move || expire(weak, epoch)))
    }

    fn persist(&self, reset_at: i64) {
        if let Err(e) = self.inner.storage.set(STORAGE_KEY, &reset_at.to_string()) {
            log::warn!("could not persist rate limit cooldown: {}", e);
        }
    }

    fn forget(&self) {
        if let Err(e) = self.inner.storage.remove(STORAGE_KEY) {
            log::warn!("could not clear persisted rate limit cooldown: {}", e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        lock_state(&self.inner)
    }
}

// A poisoned lock still holds a consistent GuardState: every transition
// writes all of its fields before anything that could panic
fn lock_state(inner: &Inner) -> MutexGuard<'_, GuardState> {
    inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Limited -> Idle, run by the scheduler. The notices go out before the lock
// is released so a report() racing in behind us shows up after them.
fn expire(weak: Weak<Inner>, epoch: u64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let guard = RateLimitGuard { inner };

    let mut state = guard.lock();
    if state.epoch != epoch {
        return;
    }
    let Some(reset_at) = state.reset_at else {
        return;
    };

    let now = guard.inner.clock.now_millis();
    if now < reset_at {
        // woke up early, wait out the rest
        let remaining = Duration::from_millis((reset_at - now) as u64);
        state.timer = Some(guard.arm(remaining, epoch));
        return;
    }

    state.reset_at = None;
    state.timer = None;
    guard.forget();
    COOLDOWN_ACTIVE.set(0.0);

    log::info!("rate limit cooldown over");
    guard.inner.notifier.dismiss(RATE_LIMIT_SLOT);
    guard.inner.notifier.show(RATE_LIMIT_SLOT, Notice::Cleared);
}
