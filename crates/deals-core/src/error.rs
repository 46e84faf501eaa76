//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors a source adapter call can produce.
///
/// None of these ever cross the orchestration boundary: `SearchService::search`
/// logs them with the source identity and degrades to an empty result set.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Network-level failure reported by the transport client
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response from a marketplace or the rate provider
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Payload arrived but does not have the expected shape
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// JSON decoding error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The per-call search deadline elapsed
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}
