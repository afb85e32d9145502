//! Error handling for catalog API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure to fetch a single catalog resource.
///
/// "Not found" and server errors are deliberately not told apart,
/// any non-success status is a [`FetchError::Status`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to '{url}' failed with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("request to '{url}' failed")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Transport failures that did not originate from reqwest,
    /// e.g. failures injected by the mock client.
    #[error("request to '{url}' failed: {message}")]
    Transport { url: String, message: String },

    #[error("could not decode response from '{url}'")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The status code, if the server responded at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Network { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the failure happened below the HTTP layer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Network { .. } | FetchError::Transport { .. }
        )
    }
}

/// Failure to construct a [`crate::CatalogClient`].
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },
    #[error("could not build HTTP client")]
    Build(#[source] reqwest::Error),
}
