//! Client-side rate-limit coordination.
//!
//! [`RateLimitGuard`] is the piece the rest of the dashboard talks to. It
//! sits on four narrow ports so it can run against real storage and timers
//! in the service and against manual ones in tests: [`Storage`],
//! [`Scheduler`], [`Clock`] and [`crate::notify::Notifier`].

pub mod clock;
pub mod detect;
pub mod guard;
pub mod scheduler;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use detect::{TOO_MANY_REQUESTS_MARKER, is_rate_limited};
pub use guard::{COOLDOWN, RateLimitGuard, RateLimitState, STORAGE_KEY};
pub use scheduler::{ManualScheduler, Scheduler, Task, TimerHandle, TokioScheduler};
pub use storage::{DisabledStorage, FileStorage, MemoryStorage, Storage};
