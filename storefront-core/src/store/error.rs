//! Store error types.

use thiserror::Error;

/// Errors that can occur while talking to the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Listener error: {0}")]
    Listener(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Network(e.to_string())
    }
}
