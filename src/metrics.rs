use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("dashboard_requests_total", "Total number of dashboard requests").unwrap();
    pub static ref BLOCKED_ACTIONS: Counter =
        register_counter!("dashboard_blocked_actions_total", "Actions skipped during a rate limit cooldown").unwrap();
    pub static ref RATE_LIMIT_REPORTS: Counter =
        register_counter!("dashboard_rate_limit_reports_total", "Cooldowns entered after the remote API throttled us").unwrap();
    pub static ref COOLDOWN_ACTIVE: Gauge =
        register_gauge!("dashboard_rate_limit_cooldown_active", "1 while a rate limit cooldown is running").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("dashboard_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("dashboard_cache_misses_total", "Total cache misses").unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("dashboard_cache_size", "Current number of items in cache").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "dashboard_upstream_latency_seconds",
        "Remote API latency in seconds"
    )
    .unwrap();
}
