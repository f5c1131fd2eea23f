//! Demo documents and collection seeding.

use std::path::Path;

use serde::Serialize;
use spruce_store::{CollectionStatus, Document, DocumentStore};

use crate::error::{Result, WorkflowError};

/// Service descriptions used as quotation context.
pub fn knowledge_base() -> Vec<Document> {
    [
        (
            "Our residential cleaning services include dusting, vacuuming, and sanitizing of all surfaces, including kitchens and bathrooms.",
            "Alice Smith",
        ),
        (
            "Our office cleaning services include daily, weekly, or monthly cleaning of your office space, including trash removal and restocking of supplies.",
            "Tech Corp",
        ),
        (
            "Our move-out cleaning services include a thorough cleaning of your old home, including the kitchen, bathrooms, and floors.",
            "John Doe",
        ),
        (
            "Our post-construction cleaning services include removal of debris, dust, and dirt from all surfaces, including floors, walls, and windows.",
            "XYZ Builders",
        ),
        (
            "Our carpet cleaning services include deep cleaning of your carpets using eco-friendly products and state-of-the-art equipment.",
            "Mary Johnson",
        ),
    ]
    .into_iter()
    .map(|(content, source)| Document::new(content).with_source(source))
    .collect()
}

/// Booking rules, flagged as scheduling-rule documents.
pub fn scheduling_rules() -> Vec<Document> {
    [
        "Can't book an appointment less than 48 hours in advance for new clients.",
        "Appointments can only be booked up to 3 months in advance.",
        "No appointments on Sundays.",
    ]
    .into_iter()
    .map(|rule| Document::scheduling_rule(rule).with_source("Booking policy"))
    .collect()
}

/// Knowledge base followed by scheduling rules.
pub fn demo_documents() -> Vec<Document> {
    let mut docs = knowledge_base();
    docs.extend(scheduling_rules());
    docs
}

/// Read documents from a JSON file of `[{"content": ..., "metadata": {...}}]`.
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let contents = std::fs::read_to_string(path).map_err(|source| WorkflowError::ReadDocuments {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| WorkflowError::ParseDocuments {
        path: path.to_path_buf(),
        source,
    })
}

/// What [`ingest`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub collection: String,
    /// True when the collection already held documents and nothing was written.
    pub skipped: bool,
    pub collection_created: bool,
    pub added: usize,
}

/// Seed `collection` with `docs` unless it already holds documents.
pub async fn ingest(
    store: &dyn DocumentStore,
    collection: &str,
    docs: &[Document],
) -> Result<IngestReport> {
    if store.has_documents(collection).await {
        tracing::info!(collection, "Documents already present, skipping ingestion");
        return Ok(IngestReport {
            collection: collection.to_string(),
            skipped: true,
            collection_created: false,
            added: 0,
        });
    }
    ingest_unchecked(store, collection, docs).await
}

/// Create the collection if needed and add `docs`, even if it is not empty.
pub async fn ingest_unchecked(
    store: &dyn DocumentStore,
    collection: &str,
    docs: &[Document],
) -> Result<IngestReport> {
    let status = store.create_collection(collection).await?;
    let added = store.add_documents(docs, collection).await?;
    tracing::info!(collection, ?status, added, "Documents ingested");

    Ok(IngestReport {
        collection: collection.to_string(),
        skipped: false,
        collection_created: status == CollectionStatus::Created,
        added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spruce_llm::MockEmbedder;
    use spruce_store::InMemoryStore;
    use std::sync::Arc;

    fn store() -> InMemoryStore {
        InMemoryStore::new(Arc::new(MockEmbedder::default()))
    }

    #[test]
    fn test_demo_documents() {
        let kb = knowledge_base();
        assert_eq!(kb.len(), 5);
        assert!(kb.iter().all(|d| !d.is_scheduling_rule() && d.source().is_some()));

        let rules = scheduling_rules();
        assert!(rules.iter().all(Document::is_scheduling_rule));
        assert!(rules.iter().any(|d| d.content == "No appointments on Sundays."));
        assert_eq!(demo_documents().len(), kb.len() + rules.len());
    }

    #[tokio::test]
    async fn test_ingest_then_skip() {
        let store = store();
        let first = ingest(&store, "demo", &demo_documents()).await.unwrap();
        assert!(!first.skipped);
        assert!(first.collection_created);
        assert_eq!(first.added, 8);

        let second = ingest(&store, "demo", &demo_documents()).await.unwrap();
        assert!(second.skipped);
        assert_eq!(second.added, 0);
        assert_eq!(store.point_count("demo").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_empty_collection_is_filled() {
        let store = store();
        store.create_collection("demo").await.unwrap();

        let report = ingest(&store, "demo", &knowledge_base()).await.unwrap();
        assert!(!report.skipped);
        assert!(!report.collection_created);
        assert_eq!(report.added, 5);
    }

    #[tokio::test]
    async fn test_unchecked_appends() {
        let store = store();
        ingest(&store, "demo", &knowledge_base()).await.unwrap();
        let report = ingest_unchecked(&store, "demo", &scheduling_rules()).await.unwrap();
        assert_eq!(report.added, 3);
        assert_eq!(store.point_count("demo").await.unwrap(), 8);
    }

    #[test]
    fn test_load_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(
            &path,
            r#"[
                {"content": "No appointments after 6pm.", "metadata": {"date_time_scheduling_rule": true}},
                {"content": "Window cleaning is available on request."}
            ]"#,
        )
        .unwrap();

        let docs = load_documents(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].is_scheduling_rule());
        assert!(docs[1].metadata.is_empty());
    }

    #[test]
    fn test_load_documents_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_documents(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, WorkflowError::ReadDocuments { .. }));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"content": "not an array"}"#).unwrap();
        let bad = load_documents(&path).unwrap_err();
        assert!(matches!(bad, WorkflowError::ParseDocuments { .. }));
    }
}
