#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use memtime_dashboard::rate_limit::{ManualClock, ManualScheduler, MemoryStorage};
use memtime_dashboard::{Dashboard, MemtimeClient, NotificationCenter, RateLimitGuard};

pub const API_KEY: &str = "test-key";
pub const T0: i64 = 1_760_000_000_000;

// How the fake remote API answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ok,
    TooManyRequests,
    MarkerInBody,
    ServerError,
}

pub struct Upstream {
    pub hits: AtomicUsize,
    pub mode: Mutex<Mode>,
    pub queries: Mutex<Vec<String>>,
    pub entries: usize,
}

impl Upstream {
    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.queries.lock().unwrap().last().cloned()
    }

    // counts the hit and answers with the failure for the current mode, if any
    fn gate(&self, headers: &HeaderMap, query: Option<String>) -> Option<Response> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.unwrap_or_default());

        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {API_KEY}"));
        if !authorized {
            return Some((StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response());
        }

        match *self.mode.lock().unwrap() {
            Mode::Ok => None,
            Mode::TooManyRequests => Some((StatusCode::TOO_MANY_REQUESTS, "slow down").into_response()),
            Mode::MarkerInBody => Some(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Too many requests, please try again later"})),
                )
                    .into_response(),
            ),
            Mode::ServerError => Some(
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "database offline"}))).into_response(),
            ),
        }
    }
}

fn entry(id: u64) -> Value {
    json!({
        "id": id,
        "taskId": 1,
        "comment": format!("entry {id}"),
        "start": "2026-10-01T08:00:00Z",
        "end": "2026-10-01T09:00:00Z",
        "createdAt": "2026-10-01T09:00:00Z"
    })
}

fn limit_from(query: &Option<String>) -> usize {
    query
        .as_deref()
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| pair.strip_prefix("limit="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(usize::MAX)
}

async fn clients(State(up): State<Arc<Upstream>>, headers: HeaderMap, RawQuery(q): RawQuery) -> Response {
    if let Some(failure) = up.gate(&headers, q) {
        return failure;
    }
    Json(json!([{"id": 1, "name": "Acme"}, {"id": 2, "name": "Globex"}])).into_response()
}

async fn projects(
    State(up): State<Arc<Upstream>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    RawQuery(q): RawQuery,
) -> Response {
    if let Some(failure) = up.gate(&headers, q) {
        return failure;
    }
    Json(json!([{"id": 10, "name": "Website", "clientId": id}])).into_response()
}

async fn tasks(
    State(up): State<Arc<Upstream>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    RawQuery(q): RawQuery,
) -> Response {
    if let Some(failure) = up.gate(&headers, q) {
        return failure;
    }
    Json(json!([{"id": 100, "name": "Design", "projectId": id}])).into_response()
}

async fn list_entries(State(up): State<Arc<Upstream>>, headers: HeaderMap, RawQuery(q): RawQuery) -> Response {
    let limit = limit_from(&q);
    if let Some(failure) = up.gate(&headers, q) {
        return failure;
    }
    let rows: Vec<Value> = (1..=up.entries as u64).take(limit).map(entry).collect();
    Json(Value::Array(rows)).into_response()
}

async fn create_entry(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(failure) = up.gate(&headers, None) {
        return failure;
    }
    let mut created = body;
    created["id"] = json!(999);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_entry(
    State(up): State<Arc<Upstream>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = up.gate(&headers, None) {
        return failure;
    }
    let mut updated = body;
    updated["id"] = json!(id);
    Json(updated).into_response()
}

async fn delete_entry(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> Response {
    if let Some(failure) = up.gate(&headers, None) {
        return failure;
    }
    Json(json!(true)).into_response()
}

// Fake remote API on an ephemeral port, returns its base url
pub async fn spawn_upstream(entries: usize) -> (String, Arc<Upstream>) {
    let upstream = Arc::new(Upstream {
        hits: AtomicUsize::new(0),
        mode: Mutex::new(Mode::Ok),
        queries: Mutex::new(Vec::new()),
        entries,
    });
    let app = Router::new()
        .route("/clients", get(clients))
        .route("/clients/{id}/projects", get(projects))
        .route("/projects/{id}/tasks", get(tasks))
        .route("/time-entries", get(list_entries).post(create_entry))
        .route("/time-entries/{id}", put(update_entry).delete(delete_entry))
        .with_state(upstream.clone());

    (serve(app).await, upstream)
}

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// Everything a test needs to drive the dashboard with hand-cranked time
pub struct Harness {
    pub dashboard: Dashboard,
    pub notifications: NotificationCenter,
    pub clock: ManualClock,
    pub scheduler: ManualScheduler,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub fn new(base_url: &str, cache_ttl: Duration) -> Self {
        let clock = ManualClock::new(T0);
        let scheduler = ManualScheduler::new(clock.clone());
        let storage = Arc::new(MemoryStorage::new());
        let notifications = NotificationCenter::new(Arc::new(clock.clone()), Arc::new(scheduler.clone()));
        let guard = RateLimitGuard::init(
            storage.clone(),
            Arc::new(scheduler.clone()),
            Arc::new(clock.clone()),
            Arc::new(notifications.clone()),
        );
        let api = MemtimeClient::new(reqwest::Client::new(), base_url, API_KEY, cache_ttl);

        Self {
            dashboard: Dashboard::new(api, guard),
            notifications,
            clock,
            scheduler,
            storage,
        }
    }
}
