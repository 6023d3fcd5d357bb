pub mod actions;
pub mod api;
pub mod cache;
pub mod config;
pub mod entry_form;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod pagination;
pub mod rate_limit;
pub mod state;
pub mod time_helpers;

// Re-export commonly used types
pub use actions::Dashboard;
pub use api::MemtimeClient;
pub use config::Args;
pub use error::{ActionError, ApiError};
pub use notify::{NotificationCenter, Notice, Notifier};
pub use rate_limit::{RateLimitGuard, RateLimitState};
pub use state::AppState;
