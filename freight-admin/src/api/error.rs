// Errors produced by the backend and geocoding fetchers.

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request rejected: {message}")]
    Rejected { message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("session expired or not signed in")]
    Unauthorized,
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("geocoding service error {code}: {message}")]
    Geocoding { code: i64, message: String },
}

impl ApiError {
    /// Text shown to the user in a notice.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message } | ApiError::Server { message, .. }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            ApiError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            ApiError::Network(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            ApiError::Geocoding { message, .. } if !message.trim().is_empty() => {
                format!("Location lookup failed: {}", message)
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Transport-level failures (timeouts, refused connections). Only these
    /// are retried, and only for idempotent geocoding GETs.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
