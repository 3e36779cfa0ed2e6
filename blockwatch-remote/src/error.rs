//! Error types for blockwatch-remote.

use std::time::Duration;

use thiserror::Error;

/// Failure modes of a remote call, classified by how a caller should react.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transient connectivity failure or server-side error; worth retrying.
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The remote signalled quota exhaustion.
    #[error("rate limited fetching {url}{}", retry_hint(.retry_after))]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    /// Repository, ref, or path does not exist; a configuration problem.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The remote refused the request (bad credentials, forbidden, malformed).
    #[error("request to {url} rejected with status {status}")]
    Rejected { url: String, status: u16 },

    /// The remote answered but the payload was not what we expected.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// Whether a retry policy may try the call again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}
