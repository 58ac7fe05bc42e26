//! Model catalog error types.

use agentdesk_files::ErrorBody;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while discovering models or updating catalog settings.
///
/// Discovery errors never reach callers of `list_models`; they are logged
/// and the failing source contributes nothing.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Connection or transport failure.
    #[error("Failed to reach {url}: {message}")]
    Request { url: String, message: String },

    /// Endpoint answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Timed out after {timeout_ms}ms waiting for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Request { .. } => "REQUEST_FAILED",
            CatalogError::Status { .. } => "HTTP_STATUS",
            CatalogError::Timeout { .. } => "TIMEOUT",
            CatalogError::Parse(_) => "PARSE_ERROR",
            CatalogError::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            CatalogError::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            CatalogError::Store(_) => "STORE_ERROR",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            code: self.code(),
        }
    }

    pub(crate) fn request(url: &str, err: reqwest::Error) -> Self {
        CatalogError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        CatalogError::Store(format!("{err:#}"))
    }
}
