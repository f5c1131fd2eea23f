//! Scheduling rule extraction.

use spruce_store::{DocumentStore, Filter};

use crate::error::Result;

/// Content of every scheduling-rule document in `collection`, in store order.
pub async fn extract_rules(store: &dyn DocumentStore, collection: &str) -> Result<Vec<String>> {
    let documents = store
        .scroll(collection, Some(&Filter::scheduling_rules()))
        .await?;
    let rules: Vec<String> = documents.into_iter().map(|doc| doc.content).collect();
    tracing::info!(collection, count = rules.len(), "Extracted scheduling rules");
    Ok(rules)
}
