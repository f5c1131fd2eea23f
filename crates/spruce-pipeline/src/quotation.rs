//! Quotation workflow.
//!
//! Retrieves knowledge base context for the request, asks the model for
//! candidate services, prices each one concurrently and formats the result.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use spruce_llm::{CompletionRequest, ContentPart, Message, SharedBackend};
use spruce_store::{Filter, SharedStore};
use tracing::Instrument;
use uuid::Uuid;

use crate::codegen::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::error::{Result, WorkflowError};
use crate::prompts::{pricing_prompt, services_prompt};

/// Progress of a quotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    #[default]
    Pending,
    Received,
    PricingComplete,
    Completed,
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Received => "received",
            QuotationStatus::PricingComplete => "pricing_complete",
            QuotationStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Everything a quotation run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationState {
    pub user_input: String,
    pub knowledge_base: String,
    /// Pricing table per service name.
    pub pricing_tables: BTreeMap<String, String>,
    pub final_quotation: String,
    pub status: QuotationStatus,
}

/// Tunables for [`QuotationWorkflow`].
#[derive(Debug, Clone)]
pub struct QuotationSettings {
    pub collection: String,
    pub model: String,
    pub max_tokens: u32,
    pub knowledge_results: usize,
    pub max_services: usize,
    /// Image attached to the service-suggestion prompt.
    pub service_image_url: Option<String>,
}

impl QuotationSettings {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            knowledge_results: 2,
            max_services: 2,
            service_image_url: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_knowledge_results(mut self, k: usize) -> Self {
        self.knowledge_results = k;
        self
    }

    pub fn with_max_services(mut self, max: usize) -> Self {
        self.max_services = max;
        self
    }

    pub fn with_service_image(mut self, url: impl Into<String>) -> Self {
        self.service_image_url = Some(url.into());
        self
    }
}

/// Split a comma-separated service list: trimmed, non-empty, first occurrence
/// kept, at most `max` entries.
pub fn parse_services(text: &str, max: usize) -> Vec<String> {
    let mut services: Vec<String> = Vec::new();
    for name in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if services.len() == max {
            break;
        }
        if !services.iter().any(|s| s == name) {
            services.push(name.to_string());
        }
    }
    services
}

/// Drafts a quotation for a cleaning request.
pub struct QuotationWorkflow {
    store: SharedStore,
    backend: SharedBackend,
    settings: QuotationSettings,
}

impl QuotationWorkflow {
    pub fn new(store: SharedStore, backend: SharedBackend, settings: QuotationSettings) -> Self {
        Self {
            store,
            backend,
            settings,
        }
    }

    /// Run all stages for `request`.
    pub async fn run(&self, request: &str) -> Result<QuotationState> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("quotation", %run_id);
        async {
            let mut state = self.gather_request(request).await?;
            let services = self.generate_services().await?;
            state.pricing_tables = self.price_services(&services).await?;
            state.status = QuotationStatus::PricingComplete;
            generate_quotation(&mut state);
            tracing::info!(services = state.pricing_tables.len(), "Quotation completed");
            Ok::<_, WorkflowError>(state)
        }
        .instrument(span)
        .await
    }

    /// Look up knowledge base context, excluding scheduling rules.
    pub async fn gather_request(&self, request: &str) -> Result<QuotationState> {
        let hits = self
            .store
            .similarity_search(
                request,
                self.settings.knowledge_results,
                &self.settings.collection,
                Some(&Filter::exclude_scheduling_rules()),
            )
            .await?;
        tracing::info!(request, hits = hits.len(), "Request received");

        let knowledge_base = hits
            .iter()
            .map(|hit| hit.document.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(QuotationState {
            user_input: request.to_string(),
            knowledge_base,
            status: QuotationStatus::Received,
            ..QuotationState::default()
        })
    }

    /// Ask the model for up to `max_services` service names.
    pub async fn generate_services(&self) -> Result<Vec<String>> {
        let mut parts = vec![ContentPart::text(services_prompt(self.settings.max_services))];
        if let Some(url) = &self.settings.service_image_url {
            parts.push(ContentPart::image_url(url));
        }

        let text = self.complete(Message::user_parts(parts)).await?;
        let services = parse_services(&text, self.settings.max_services);
        if services.is_empty() {
            return Err(WorkflowError::Generation("service names".to_string()));
        }
        tracing::info!(?services, "Services generated");
        Ok(services)
    }

    /// One pricing table per service, requested concurrently.
    pub async fn price_services(&self, services: &[String]) -> Result<BTreeMap<String, String>> {
        let tables = try_join_all(services.iter().map(|service| async move {
            let table = self.complete(Message::user(pricing_prompt(service))).await?;
            tracing::debug!(service = %service, bytes = table.len(), "Pricing table generated");
            Ok::<_, WorkflowError>((service.clone(), table))
        }))
        .await?;
        Ok(tables.into_iter().collect())
    }

    async fn complete(&self, message: Message) -> Result<String> {
        let request = CompletionRequest::new(
            &self.settings.model,
            vec![message],
            self.settings.max_tokens,
        );
        Ok(self.backend.complete(request).await?.content)
    }
}

/// Format the final quotation from the pricing tables.
pub fn generate_quotation(state: &mut QuotationState) {
    let details = state
        .pricing_tables
        .iter()
        .map(|(service, table)| format!("{}: {}", service, table))
        .collect::<Vec<_>>()
        .join("\n");
    state.final_quotation = format!("Quotation Details:\n{}", details);
    state.status = QuotationStatus::Completed;
}
