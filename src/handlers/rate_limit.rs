use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::notify::{Notifier, Toast};
use crate::rate_limit::RateLimitState;
use crate::state::AppState;

// inline status for views that render the cooldown themselves
pub async fn rate_limit_handler(State(state): State<Arc<AppState>>) -> Json<RateLimitState> {
    Json(state.guard().state())
}

// the notice currently in a slot, countdown rendered as of now
pub async fn notification_handler(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<String>,
) -> Json<Option<Toast>> {
    Json(state.notifications.current(&slot))
}

pub async fn dismiss_notification_handler(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<String>,
) -> StatusCode {
    state.notifications.dismiss(&slot);
    StatusCode::NO_CONTENT
}
