use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;

use crate::rate_limit::{Clock, Scheduler, TimerHandle};

/// Slot shared by every rate-limit notice, so a new one replaces the old.
pub const RATE_LIMIT_SLOT: &str = "rate-limit-toast";

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    // a request was just throttled, live countdown to reset_at
    LimitEntered { reset_at: i64 },
    // a blocked action was attempted while cooling down
    StillActive { reset_at: i64 },
    // shown once when the cooldown runs out
    Cleared,
}

impl Notice {
    pub fn reset_at(&self) -> Option<i64> {
        match self {
            Notice::LimitEntered { reset_at } | Notice::StillActive { reset_at } => Some(*reset_at),
            Notice::Cleared => None,
        }
    }
}

/// Surface that shows notices to the user.
///
/// The rate-limit guard calls into its notifier while holding its own state
/// lock, so notices land in the same order as the transitions that raised
/// them. Implementations must not call back into the guard.
pub trait Notifier: Send + Sync {
    fn show(&self, slot: &str, notice: Notice);
    fn dismiss(&self, slot: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Info,
}

// A notice rendered at a given instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub slot: String,
    pub level: Level,
    pub title: String,
    pub description: Option<String>,
    pub remaining_seconds: Option<u64>,
    pub dismissible: bool,
}

// Whole seconds left, rounded up, never negative
pub fn remaining_seconds(reset_at: i64, now: i64) -> u64 {
    let millis = (reset_at - now).max(0) as u64;
    millis.div_ceil(1000)
}

pub fn render(slot: &str, notice: Notice, now: i64) -> Toast {
    let countdown = |reset_at: i64| {
        let secs = remaining_seconds(reset_at, now);
        (
            Some(format!(
                "You have made too many requests. Please wait {secs}s."
            )),
            Some(secs),
        )
    };

    let (level, title, (description, remaining_seconds)) = match notice {
        Notice::LimitEntered { reset_at } => (Level::Error, "Rate limit exceeded", countdown(reset_at)),
        Notice::StillActive { reset_at } => (Level::Error, "Action Blocked", countdown(reset_at)),
        Notice::Cleared => (
            Level::Info,
            "Rate limit cooldown over. You can continue.",
            (None, None),
        ),
    };

    Toast {
        slot: slot.to_string(),
        level,
        title: title.to_string(),
        description,
        remaining_seconds,
        dismissible: true,
    }
}

struct Slot {
    notice: Notice,
    epoch: u64,
    renders: u64,
    ticker: Option<TimerHandle>,
}

struct Slots {
    next_epoch: u64,
    by_id: HashMap<String, Slot>,
}

struct Inner {
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    slots: Mutex<Slots>,
}

/// In-process notification surface.
///
/// Keeps at most one notice per slot. Countdown notices are re-rendered
/// every second until they reach zero or get replaced or dismissed; the
/// current rendering can be read at any time through [`NotificationCenter::current`].
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock,
                scheduler,
                slots: Mutex::new(Slots {
                    next_epoch: 0,
                    by_id: HashMap::new(),
                }),
            }),
        }
    }

    pub fn current(&self, slot: &str) -> Option<Toast> {
        let slots = self.inner.slots.lock().ok()?;
        let entry = slots.by_id.get(slot)?;
        Some(render(slot, entry.notice, self.inner.clock.now_millis()))
    }

    // How many times the notice in `slot` has been rendered since it was shown
    pub fn renders(&self, slot: &str) -> u64 {
        self.inner
            .slots
            .lock()
            .ok()
            .and_then(|slots| slots.by_id.get(slot).map(|s| s.renders))
            .unwrap_or(0)
    }
}

impl Notifier for NotificationCenter {
    fn show(&self, slot: &str, notice: Notice) {
        let Ok(mut slots) = self.inner.slots.lock() else {
            return;
        };
        slots.next_epoch += 1;
        let epoch = slots.next_epoch;

        if let Some(old) = slots.by_id.remove(slot) {
            if let Some(ticker) = old.ticker {
                ticker.cancel();
            }
        }

        let toast = render(slot, notice, self.inner.clock.now_millis());
        match toast.level {
            Level::Error => log::warn!(
                "[{}] {}: {}",
                slot,
                toast.title,
                toast.description.as_deref().unwrap_or_default()
            ),
            Level::Info => log::info!("[{}] {}", slot, toast.title),
        }

        let ticker = match toast.remaining_seconds {
            Some(secs) if secs > 0 => Some(schedule_tick(&self.inner, slot.to_string(), epoch)),
            _ => None,
        };

        slots.by_id.insert(
            slot.to_string(),
            Slot {
                notice,
                epoch,
                renders: 1,
                ticker,
            },
        );
    }

    fn dismiss(&self, slot: &str) {
        let Ok(mut slots) = self.inner.slots.lock() else {
            return;
        };
        if let Some(old) = slots.by_id.remove(slot) {
            log::debug!("[{}] dismissed", slot);
            if let Some(ticker) = old.ticker {
                ticker.cancel();
            }
        }
    }
}

fn schedule_tick(inner: &Arc<Inner>, slot: String, epoch: u64) -> TimerHandle {
    let weak = Arc::downgrade(inner);
    inner
        .scheduler
        .after(COUNTDOWN_TICK, Box::new(move || tick(weak, slot, epoch)))
}

fn tick(weak: Weak<Inner>, slot: String, epoch: u64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let Ok(mut slots) = inner.slots.lock() else {
        return;
    };
    let now = inner.clock.now_millis();
    let Some(entry) = slots.by_id.get_mut(&slot) else {
        return;
    };
    if entry.epoch != epoch {
        return;
    }

    let toast = render(&slot, entry.notice, now);
    entry.renders += 1;
    log::debug!(
        "[{}] {}",
        slot,
        toast.description.as_deref().unwrap_or_default()
    );

    entry.ticker = match toast.remaining_seconds {
        Some(secs) if secs > 0 => Some(schedule_tick(&inner, slot.clone(), epoch)),
        _ => None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::{ManualClock, ManualScheduler};

    fn center() -> (NotificationCenter, ManualClock, ManualScheduler) {
        let clock = ManualClock::new(1_000_000);
        let scheduler = ManualScheduler::new(clock.clone());
        let center = NotificationCenter::new(Arc::new(clock.clone()), Arc::new(scheduler.clone()));
        (center, clock, scheduler)
    }

    #[test]
    fn remaining_seconds_rounds_up() {
        assert_eq!(remaining_seconds(10_000, 0), 10);
        assert_eq!(remaining_seconds(10_000, 1), 10);
        assert_eq!(remaining_seconds(10_000, 9_001), 1);
        assert_eq!(remaining_seconds(10_000, 10_000), 0);
        assert_eq!(remaining_seconds(10_000, 20_000), 0);
    }

    #[test]
    fn countdown_rerenders_every_second() {
        let (center, clock, scheduler) = center();
        let reset_at = clock.now_millis() + 5_000;
        center.show(RATE_LIMIT_SLOT, Notice::LimitEntered { reset_at });

        let toast = center.current(RATE_LIMIT_SLOT).unwrap();
        assert_eq!(toast.title, "Rate limit exceeded");
        assert_eq!(toast.remaining_seconds, Some(5));
        assert_eq!(
            toast.description.as_deref(),
            Some("You have made too many requests. Please wait 5s.")
        );

        scheduler.advance(Duration::from_secs(2));
        assert_eq!(center.renders(RATE_LIMIT_SLOT), 3);
        assert_eq!(center.current(RATE_LIMIT_SLOT).unwrap().remaining_seconds, Some(3));

        // the ticker stops once it hits zero
        scheduler.advance(Duration::from_secs(10));
        assert_eq!(center.renders(RATE_LIMIT_SLOT), 6);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn new_notice_replaces_old_one() {
        let (center, clock, scheduler) = center();
        let reset_at = clock.now_millis() + 60_000;
        center.show(RATE_LIMIT_SLOT, Notice::LimitEntered { reset_at });
        center.show(RATE_LIMIT_SLOT, Notice::StillActive { reset_at });

        assert_eq!(center.current(RATE_LIMIT_SLOT).unwrap().title, "Action Blocked");
        // only the replacement's ticker is alive
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn dismiss_stops_the_countdown() {
        let (center, clock, scheduler) = center();
        center.show(
            RATE_LIMIT_SLOT,
            Notice::LimitEntered {
                reset_at: clock.now_millis() + 60_000,
            },
        );
        center.dismiss(RATE_LIMIT_SLOT);

        assert!(center.current(RATE_LIMIT_SLOT).is_none());
        assert_eq!(scheduler.pending(), 0);
        // dismissing an empty slot is harmless
        center.dismiss(RATE_LIMIT_SLOT);
    }

    #[test]
    fn cleared_notice_has_no_countdown() {
        let (center, _clock, scheduler) = center();
        center.show(RATE_LIMIT_SLOT, Notice::Cleared);

        let toast = center.current(RATE_LIMIT_SLOT).unwrap();
        assert_eq!(toast.level, Level::Info);
        assert_eq!(toast.remaining_seconds, None);
        assert_eq!(scheduler.pending(), 0);
    }
}
