//! LLM client abstraction for Spruce.
//!
//! This crate provides the chat-completion and embedding clients used by the
//! workflows, plus mock implementations for tests and offline runs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │  LlmBackend trait        │     │  Embedder trait          │
//! │  - complete() -> text    │     │  - embed_batch() -> vecs │
//! └──────────────────────────┘     └──────────────────────────┘
//!         │                                │
//!     ┌───┴────────┐                  ┌────┴─────────┐
//!     ▼            ▼                  ▼              ▼
//! ┌────────┐  ┌────────┐         ┌──────────┐  ┌──────────┐
//! │ OpenAI │  │  Mock  │         │  OpenAI  │  │   Mock   │
//! └────────┘  └────────┘         └──────────┘  └──────────┘
//! ```

pub mod backend;
pub mod embeddings;
pub mod error;
pub mod openai;
pub mod types;

pub use backend::{LlmBackend, MockBackend, MockResponse, SharedBackend, with_retry};
pub use error::{LlmError, RateLimitInfo, Result};
pub use types::{
    CompletionRequest, CompletionResponse, Content, ContentPart, Message, Role, StopReason, Usage,
};

pub use embeddings::{
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, Embedder, EmbedderSpec, MockEmbedder,
    OpenAiEmbedder, OpenAiEmbedderConfig, SharedEmbedder, build_embedder, cosine_similarity,
};
pub use openai::{OpenAiBackend, OpenAiConfig, create_shared_backend};
