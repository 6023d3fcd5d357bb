use reqwest::StatusCode;
use serde::Deserialize;

/// Text the remote API puts in its error body when it throttles us.
pub const TOO_MANY_REQUESTS_MARKER: &str = "too many requests";

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

// Prefer the JSON `error` field, fall back to the raw body
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    }
}

/// 429, or any error text carrying the throttling marker.
pub fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || mentions_rate_limit(&error_message(body))
}

pub fn mentions_rate_limit(message: &str) -> bool {
    message.to_lowercase().contains(TOO_MANY_REQUESTS_MARKER)
}
