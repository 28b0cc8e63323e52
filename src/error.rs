use thiserror::Error;

/// Failures at the remote contact source boundary.
///
/// An empty page is not an error; it is treated as the last page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        FetchError::Malformed(reason.into())
    }

    /// Short label for the status line.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid url",
            FetchError::Network { .. } => "network error",
            FetchError::Status { .. } => "server error",
            FetchError::Malformed(_) => "malformed response",
        }
    }
}
