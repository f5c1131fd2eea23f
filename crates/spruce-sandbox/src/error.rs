//! Error types for sandbox operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running code in the sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// HTTP request failed before a response was received.
    #[error("Sandbox HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The sandbox rejected the request.
    #[error("Sandbox API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// No installed runtime matches the requested language.
    #[error("No sandbox runtime for language '{language}'")]
    RuntimeNotFound { language: String },

    /// The run (or the round-trip) exceeded its time limit.
    #[error("Sandbox execution timed out after {0:?}")]
    Timeout(Duration),

    /// The sandbox answered with something we could not interpret.
    #[error("Invalid sandbox response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Invalid sandbox configuration: {0}")]
    Config(String),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
