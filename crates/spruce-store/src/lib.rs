//! Vector document storage for Spruce.
//!
//! This crate provides the document store the workflows read from: a
//! [`DocumentStore`] trait with a Qdrant REST implementation and an in-memory
//! one, plus the metadata [`Filter`]s used to separate booking rules from
//! general knowledge.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  DocumentStore trait                         │
//! │  - create_collection / add_documents         │
//! │  - similarity_search / scroll / point_count  │
//! └──────────────────────────────────────────────┘
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │ QdrantStore │          │ InMemoryStore │
//!   │  (reqwest)  │          │ (RwLock map)  │
//!   └─────────────┘          └───────────────┘
//!          │                         │
//!          └──────── Embedder ───────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use spruce_llm::MockEmbedder;
//! use spruce_store::{Document, DocumentStore, Filter, InMemoryStore};
//!
//! # async fn example() -> spruce_store::Result<()> {
//! let store = InMemoryStore::new(Arc::new(MockEmbedder::default()));
//! store.create_collection("spruce").await?;
//! store
//!     .add_documents(&[Document::scheduling_rule("No appointments are available on Sundays.")], "spruce")
//!     .await?;
//!
//! let rules = store.scroll("spruce", Some(&Filter::scheduling_rules())).await?;
//! assert_eq!(rules.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod document;
pub mod error;
pub mod filter;
pub mod memory;
pub mod qdrant;

pub use backend::{CollectionStatus, DEFAULT_VECTOR_SIZE, DocumentStore, SharedStore};
pub use document::{Document, Metadata, SCHEDULING_RULE_KEY, SOURCE_KEY, ScoredDocument};
pub use error::{Result, StoreError};
pub use filter::{Condition, Filter};
pub use memory::InMemoryStore;
pub use qdrant::{DEFAULT_QDRANT_URL, QdrantConfig, QdrantStore};
