use crate::actions::Dashboard;
use crate::notify::NotificationCenter;
use crate::rate_limit::RateLimitGuard;

// app's shared state

pub struct AppState {
    pub dashboard: Dashboard,
    pub notifications: NotificationCenter,
}

impl AppState {
    pub fn guard(&self) -> &RateLimitGuard {
        self.dashboard.guard()
    }
}
