use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("optimizer returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("optimizer response has no {what}")]
    MissingField { what: &'static str },

    #[error("optimizer response holds no placements")]
    NoPlacements,
}

impl SyncError {
    #[must_use]
    pub fn missing(what: &'static str) -> Self {
        Self::MissingField { what }
    }

    /// Whether the failure happened before a response body was examined.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}
