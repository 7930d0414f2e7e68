//! Error types for the API client.

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request never produced a response (connect failure, timeout, body read).
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// The API answered HTTP 429.
    #[error("Rate limited by Kite API (HTTP 429)")]
    RateLimited,
    /// The API returned its error envelope (`status: "error"`).
    #[error("Kite API error {error_type} (HTTP {status}): {message}")]
    Api {
        status: u16,
        error_type: String,
        message: String,
    },
    /// The API returned a non-success status without a recognizable error envelope.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl Error {
    /// True when the credentials were rejected. Repeating the call cannot succeed.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Api {
                status, error_type, ..
            } => {
                error_type == "TokenException"
                    || error_type == "PermissionException"
                    || *status == 401
                    || *status == 403
            }
            Self::HttpStatus { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// True for failures worth another attempt after a backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::RateLimited => true,
            Self::Api {
                status, error_type, ..
            } => *status >= 500 || error_type == "NetworkException",
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::Parse(_) => false,
        }
    }
}
