//! Errors from the remote backend.

/// Backend access error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No credential available; nothing was sent
    #[error("Not authenticated")]
    Unauthenticated,
    /// The request did not complete within the client timeout
    #[error("Request timed out")]
    Timeout,
    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),
    /// The resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// HTTP client or runtime could not be created
    #[error("Client setup error: {0}")]
    Setup(String),
}

impl ApiError {
    /// Build an error from a non-success response. FastAPI puts a readable
    /// message in `detail`; anything else falls back to the status code.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| format!("API Error: {status}"));

        if status == 404 {
            ApiError::NotFound(message)
        } else {
            ApiError::Server { status, message }
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Text for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } | ApiError::NotFound(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
