mod clients;
mod health;
mod metrics;
mod rate_limit;
mod time_entries;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::error::ActionError;
use crate::state::AppState;

pub use clients::{clients_handler, projects_handler, tasks_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use rate_limit::{dismiss_notification_handler, notification_handler, rate_limit_handler};
pub use time_entries::{
    create_entry_handler, delete_entry_handler, list_entries_handler, update_entry_handler,
};

// creating the router with routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/rate-limit", get(rate_limit_handler))
        .route("/api/notifications/{slot}", get(notification_handler))
        .route(
            "/api/notifications/{slot}/dismiss",
            post(dismiss_notification_handler),
        )
        .route("/api/clients", get(clients_handler))
        .route("/api/clients/{id}/projects", get(projects_handler))
        .route("/api/projects/{id}/tasks", get(tasks_handler))
        .route(
            "/api/time-entries",
            get(list_entries_handler).post(create_entry_handler),
        )
        .route(
            "/api/time-entries/{id}",
            put(update_entry_handler).delete(delete_entry_handler),
        )
        .with_state(state)
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = match &self {
            ActionError::Blocked { .. } | ActionError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ActionError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ActionError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let reset_at = match &self {
            ActionError::Blocked { reset_at } => Some(*reset_at),
            _ => None,
        };
        let body = serde_json::json!({
            "error": self.to_string(),
            "rateLimited": self.is_rate_limit(),
            "resetAt": reset_at,
        });
        (status, Json(body)).into_response()
    }
}
