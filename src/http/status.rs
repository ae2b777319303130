//! Human-readable classification of failed HTTP responses.

use reqwest::StatusCode;

/// A download answered with a non-success status.
#[derive(Debug, PartialEq)]
pub enum HttpStatusError {
    /// HTTP 401
    AuthenticationFailed,
    /// HTTP 403
    Forbidden,
    /// HTTP 404, usually a release that was never published for this version
    NotFound,
    /// HTTP 429
    RateLimitExceeded,
    /// Other 4xx
    ClientError(u16),
    /// 5xx
    ServerError(u16),
}

impl HttpStatusError {
    pub fn classify(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => HttpStatusError::AuthenticationFailed,
            StatusCode::FORBIDDEN => HttpStatusError::Forbidden,
            StatusCode::NOT_FOUND => HttpStatusError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => HttpStatusError::RateLimitExceeded,
            s if s.is_client_error() => HttpStatusError::ClientError(s.as_u16()),
            s => HttpStatusError::ServerError(s.as_u16()),
        }
    }
}

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpStatusError::AuthenticationFailed => {
                write!(f, "Authentication failed (HTTP 401). Check your GITHUB_TOKEN.")
            }
            HttpStatusError::Forbidden => write!(
                f,
                "Access forbidden (HTTP 403). You may be rate limited or need GITHUB_TOKEN."
            ),
            HttpStatusError::NotFound => write!(
                f,
                "Not found (HTTP 404). Check that the release version exists."
            ),
            HttpStatusError::RateLimitExceeded => {
                write!(f, "Rate limit exceeded (HTTP 429). Try again later.")
            }
            HttpStatusError::ClientError(code) => write!(f, "Request error (HTTP {})", code),
            HttpStatusError::ServerError(code) => write!(f, "Server error (HTTP {})", code),
        }
    }
}

impl std::error::Error for HttpStatusError {}
