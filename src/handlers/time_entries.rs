use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::entry_form::EntryForm;
use crate::error::ActionError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::TimeEntry;
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;

pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<TimeEntry>>, ActionError> {
    REQUEST_TOTAL.inc();
    state.dashboard.time_entries_page(query).await.map(Json)
}

pub async fn create_entry_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<EntryForm>,
) -> Result<(StatusCode, Json<TimeEntry>), ActionError> {
    REQUEST_TOTAL.inc();
    let entry = state.dashboard.submit_entry(&form, None).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(form): Json<EntryForm>,
) -> Result<Json<TimeEntry>, ActionError> {
    REQUEST_TOTAL.inc();
    state.dashboard.submit_entry(&form, Some(id)).await.map(Json)
}

pub async fn delete_entry_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ActionError> {
    REQUEST_TOTAL.inc();
    state.dashboard.delete_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
