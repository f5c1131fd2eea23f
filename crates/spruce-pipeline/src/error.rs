//! Error types for the workflows.

use std::path::PathBuf;

use thiserror::Error;

use spruce_llm::LlmError;
use spruce_sandbox::SandboxError;
use spruce_store::StoreError;

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors that abort a workflow run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Document store query or write failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Language model call failed.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Generated code could not be run or its output could not be read.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Sandbox transport failed.
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    /// The model answered with nothing usable.
    #[error("Generation produced no {0}")]
    Generation(String),

    /// A documents file could not be read.
    #[error("Failed to read documents from {path}: {source}")]
    ReadDocuments {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A documents file is not a JSON array of documents.
    #[error("Invalid documents file {path}: {source}")]
    ParseDocuments {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Distinct ways a validation script can fail.
///
/// Every variant displays as `validation execution failed: ...`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A generated snippet does not define the expected function.
    #[error("validation execution failed: generated code breaks the contract: {0}")]
    Contract(String),

    /// The script printed nothing and exited with an error.
    #[error("validation execution failed: script exited with {code:?}: {stderr}")]
    ScriptFailed { code: Option<i32>, stderr: String },

    /// The script printed nothing.
    #[error("validation execution failed: empty output")]
    EmptyOutput,

    /// Output is not JSON.
    #[error("validation execution failed: output is not JSON: {0}")]
    MalformedOutput(String),

    /// Output is JSON but has no list of error strings.
    #[error("validation execution failed: output has no validation_errors list")]
    MissingErrors,
}
