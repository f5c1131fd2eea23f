//! Error types for the store crate.

use spruce_llm::LlmError;
use thiserror::Error;

/// Errors that can occur talking to a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the store.
        message: String,
    },

    /// The named collection does not exist.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Embedding the documents or the query failed.
    #[error("Embedding error: {0}")]
    Embedding(#[from] LlmError),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store returned something we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The store URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StoreError {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::CollectionNotFound(_))
            || matches!(self, StoreError::Api { status: 404, .. })
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
