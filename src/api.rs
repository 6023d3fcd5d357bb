use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{ResponseCache, make_cache_key};
use crate::error::ApiError;
use crate::metrics::UPSTREAM_LATENCY;
use crate::models::{Client, PaginationParams, Project, SortOrder, Task, TimeEntry, TimeEntryInput};
use crate::rate_limit::detect::{error_message, is_rate_limited};

const CLIENTS_TAG: &str = "clients";
const TIME_ENTRIES_TAG: &str = "time-entries";

// Client for the remote time tracking API
#[derive(Clone)]
pub struct MemtimeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Arc<ResponseCache>,
}

impl MemtimeClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, cache_ttl: Duration) -> Self {
        // add http:// if not present
        let base_url = base_url.trim().trim_end_matches('/');
        let base_url = if base_url.starts_with("http") {
            base_url.to_string()
        } else {
            format!("http://{}", base_url)
        };
        Self {
            http,
            base_url,
            api_key: api_key.to_string(),
            cache: Arc::new(ResponseCache::new(cache_ttl)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub async fn get_clients(&self, params: &PaginationParams) -> Result<Vec<Client>, ApiError> {
        self.get_cached("/clients", &params.to_query(), CLIENTS_TAG).await
    }

    pub async fn get_projects(&self, client_id: u64) -> Result<Vec<Project>, ApiError> {
        let query = sorted("id", SortOrder::Asc);
        self.get_cached(&format!("/clients/{client_id}/projects"), &query, CLIENTS_TAG)
            .await
    }

    pub async fn get_tasks(&self, project_id: u64) -> Result<Vec<Task>, ApiError> {
        let query = sorted("name", SortOrder::Asc);
        self.get_cached(&format!("/projects/{project_id}/tasks"), &query, CLIENTS_TAG)
            .await
    }

    // Sorted by start time, oldest first, unless the caller says otherwise
    pub async fn get_time_entries(&self, params: &PaginationParams) -> Result<Vec<TimeEntry>, ApiError> {
        let params = PaginationParams {
            sort_by: Some(params.sort_by.clone().unwrap_or_else(|| "start".to_string())),
            order: Some(params.order.unwrap_or(SortOrder::Asc)),
            ..params.clone()
        };
        self.get_cached("/time-entries", &params.to_query(), TIME_ENTRIES_TAG)
            .await
    }

    pub async fn create_time_entry(&self, input: &TimeEntryInput) -> Result<TimeEntry, ApiError> {
        let body = self.send(Method::POST, "/time-entries", &[], Some(input)).await?;
        self.cache.invalidate(TIME_ENTRIES_TAG);
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn update_time_entry(&self, id: u64, input: &TimeEntryInput) -> Result<TimeEntry, ApiError> {
        let body = self
            .send(Method::PUT, &format!("/time-entries/{id}"), &[], Some(input))
            .await?;
        self.cache.invalidate(TIME_ENTRIES_TAG);
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn delete_time_entry(&self, id: u64) -> Result<(), ApiError> {
        self.send::<()>(Method::DELETE, &format!("/time-entries/{id}"), &[], None)
            .await?;
        self.cache.invalidate(TIME_ENTRIES_TAG);
        Ok(())
    }

    async fn get_cached<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        tag: &'static str,
    ) -> Result<T, ApiError> {
        let cache_key = make_cache_key(path, query);

        // check cache first
        if let Some(body) = self.cache.get(&cache_key) {
            if let Ok(parsed) = serde_json::from_str(&body) {
                return Ok(parsed);
            }
        }

        let body = self.send::<()>(Method::GET, path, query, None).await?;
        let parsed = serde_json::from_str(&body)?;
        self.cache.insert(cache_key, tag, body);
        Ok(parsed)
    }

    // One round trip; non-2xx becomes an ApiError, 429 and friends become RateLimited
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let start_time = Instant::now();
        let response = request.send().await;
        UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

        let response = response.map_err(|e| {
            log::error!("{} {} failed: {}", method, path, e);
            ApiError::Transport(e)
        })?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }
        log::error!("{} {} returned {}: {}", method, path, status, text);
        Err(classify(status, &text))
    }
}

fn sorted(sort_by: &str, order: SortOrder) -> Vec<(&'static str, String)> {
    PaginationParams {
        sort_by: Some(sort_by.to_string()),
        order: Some(order),
        ..PaginationParams::default()
    }
    .to_query()
}

fn classify(status: StatusCode, body: &str) -> ApiError {
    if is_rate_limited(status, body) {
        return ApiError::RateLimited;
    }
    let message = error_message(body);
    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        message
    };
    ApiError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_throttling() {
        assert!(matches!(
            classify(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, r#"{"error":"Too many requests"}"#),
            ApiError::RateLimited
        ));
    }

    #[test]
    fn classify_keeps_other_messages() {
        match classify(StatusCode::NOT_FOUND, r#"{"error":"entry not found"}"#) {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "entry not found");
            }
            other => panic!("unexpected {other:?}"),
        }
        match classify(StatusCode::BAD_GATEWAY, "") {
            ApiError::Status { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn base_url_is_normalised() {
        let client = MemtimeClient::new(reqwest::Client::new(), "localhost:9000/", "k", Duration::ZERO);
        assert_eq!(client.base_url(), "http://localhost:9000");
    }
}
