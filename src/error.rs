use reqwest::StatusCode;

// Durable storage failures never leave the guard; they are logged and dropped
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Too many requests")]
    RateLimited,

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Task ID is required")]
    MissingTaskId,

    #[error("Comment is required")]
    MissingComment,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} is not valid: {value}")]
    Unparsable { field: &'static str, value: String },

    #[error("End time must be after start time")]
    EndBeforeStart,

    #[error("Cannot create time entries for the future")]
    EndInFuture,
}

/// What a dashboard action returns when it did not complete.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    // the guard refused before any request went out
    #[error("Too many requests. Waiting for cooldown...")]
    Blocked { reset_at: i64 },

    // the remote API said so; the guard has been told
    #[error("Too many requests")]
    RateLimited,

    #[error("{0}")]
    Fetch(String),

    #[error(transparent)]
    Invalid(#[from] FormError),
}

impl ActionError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ActionError::Blocked { .. } | ActionError::RateLimited)
    }
}
