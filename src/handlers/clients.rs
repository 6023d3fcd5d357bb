use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use crate::error::ActionError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{Client, PaginationParams, Project, Task};
use crate::state::AppState;

pub async fn clients_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<Client>>, ActionError> {
    REQUEST_TOTAL.inc();
    state.dashboard.list_clients(&params).await.map(Json)
}

pub async fn projects_handler(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<u64>,
) -> Result<Json<Vec<Project>>, ActionError> {
    REQUEST_TOTAL.inc();
    state.dashboard.expand_client(client_id).await.map(Json)
}

pub async fn tasks_handler(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<u64>,
) -> Result<Json<Vec<Task>>, ActionError> {
    REQUEST_TOTAL.inc();
    state.dashboard.expand_project(project_id).await.map(Json)
}
