//! Builds the store, model, and sandbox clients from the resolved config.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use spruce_config::{
    ConfigError, EmbeddingProvider, OPENAI_API_KEY_ENV, QDRANT_API_KEY_ENV, SandboxConfig,
    resolve_secret,
};
use spruce_llm::{
    EmbedderSpec, MockEmbedder, OpenAiConfig, SharedBackend, SharedEmbedder, build_embedder,
    create_shared_backend,
};
use spruce_pipeline::seed::demo_documents;
use spruce_pipeline::{CodeGenerator, ValidationRunner, WorkflowContext, ingest};
use spruce_sandbox::{ExecutionLimits, PistonConfig, PistonExecutor, SharedExecutor};
use spruce_store::{InMemoryStore, QdrantConfig, QdrantStore, SharedStore};

use crate::commands::Context;

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// Embedder for documents and queries.
///
/// Offline mode always uses the token-hashing mock.
pub fn embedder(ctx: &Context) -> Result<SharedEmbedder> {
    let embedding = ctx.config().effective_embedding();
    if ctx.offline || embedding.provider == EmbeddingProvider::Mock {
        return Ok(Arc::new(MockEmbedder::new(embedding.dimensions)));
    }

    let api_key = resolve_secret(OPENAI_API_KEY_ENV, embedding.api_key.as_deref());
    if let Some(secret) = &api_key {
        tracing::debug!(source = %secret.source, "Resolved embedding API key");
    }
    let spec = EmbedderSpec {
        provider: embedding.provider.as_str().to_string(),
        openai_api_key: api_key.map(|s| s.value),
        openai_model: Some(embedding.model),
        openai_base_url: embedding.base_url,
        dimensions: Some(embedding.dimensions),
    };
    build_embedder(&spec).context("failed to build embedder")
}

/// The configured document store and collection name.
///
/// Offline, the store lives in memory and is seeded with the demo documents
/// on every invocation.
pub async fn store(ctx: &Context) -> Result<(SharedStore, String)> {
    let store_config = ctx.config().effective_store();
    let collection = store_config.collection.clone();
    let embedder = embedder(ctx)?;

    if ctx.offline {
        let store: SharedStore = Arc::new(InMemoryStore::new(embedder));
        ingest(store.as_ref(), &collection, &demo_documents())
            .await
            .context("failed to seed the in-memory store")?;
        return Ok((store, collection));
    }

    let mut qdrant = QdrantConfig::new(&store_config.url)
        .with_vector_size(store_config.vector_size)
        .with_scroll_page_size(store_config.scroll_page_size);
    if let Some(secret) = resolve_secret(QDRANT_API_KEY_ENV, store_config.api_key.as_deref()) {
        tracing::debug!(source = %secret.source, "Resolved Qdrant API key");
        qdrant = qdrant.with_api_key(secret.value);
    }
    let store = QdrantStore::new(qdrant, embedder)
        .with_context(|| format!("invalid Qdrant URL '{}'", store_config.url))?;
    Ok((Arc::new(store), collection))
}

// ─────────────────────────────────────────────────────────────────────────────
// Language Model
// ─────────────────────────────────────────────────────────────────────────────

/// Chat-completion backend.
///
/// A key is required unless `[llm] base_url` points at a keyless server.
pub fn backend(ctx: &Context) -> Result<SharedBackend> {
    let llm = ctx.config().effective_llm();

    let mut openai = match resolve_secret(OPENAI_API_KEY_ENV, llm.api_key.as_deref()) {
        Some(secret) => {
            tracing::debug!(source = %secret.source, "Resolved LLM API key");
            OpenAiConfig::openai(secret.value)
        }
        None if llm.base_url.is_some() => OpenAiConfig {
            api_key: None,
            ..OpenAiConfig::openai(String::new())
        },
        None => {
            return Err(ConfigError::MissingSecret {
                name: "LLM API key".to_string(),
                env_var: OPENAI_API_KEY_ENV.to_string(),
            }
            .into());
        }
    };
    if let Some(url) = &llm.base_url {
        openai = openai.with_base_url(url);
    }
    openai = openai
        .with_model(&llm.model)
        .with_timeout(llm.timeout())
        .with_max_retries(llm.max_retries);

    create_shared_backend(openai).context("failed to build LLM backend")
}

/// Code generator with the configured model settings.
pub fn generator(ctx: &Context, backend: SharedBackend) -> CodeGenerator {
    let llm = ctx.config().effective_llm();
    CodeGenerator::new(backend)
        .with_model(llm.model)
        .with_temperature(llm.temperature)
        .with_max_tokens(llm.max_tokens)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sandbox
// ─────────────────────────────────────────────────────────────────────────────

pub fn limits(sandbox: &SandboxConfig) -> ExecutionLimits {
    let limits = ExecutionLimits::new()
        .with_run_timeout(sandbox.run_timeout())
        .with_compile_timeout(sandbox.compile_timeout());
    match sandbox.memory_limit_bytes {
        Some(bytes) => limits.with_memory_limit(bytes),
        None => limits,
    }
}

pub fn executor(ctx: &Context) -> Result<SharedExecutor> {
    let sandbox = ctx.config().effective_sandbox();
    let mut piston =
        PistonConfig::new(&sandbox.base_url).with_request_grace(sandbox.request_grace());
    if let Some(version) = &sandbox.version {
        piston = piston.with_default_version(version);
    }
    let executor = PistonExecutor::new(piston)
        .with_context(|| format!("invalid sandbox URL '{}'", sandbox.base_url))?;
    Ok(Arc::new(executor))
}

// ─────────────────────────────────────────────────────────────────────────────
// Workflows
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a scheduling run needs.
pub async fn workflow_context(ctx: &Context) -> Result<WorkflowContext> {
    ctx.config().validate().context("invalid configuration")?;

    let (store, collection) = store(ctx).await?;
    let generator = generator(ctx, backend(ctx)?);
    let sandbox = ctx.config().effective_sandbox();
    let mut runner = ValidationRunner::new(executor(ctx)?).with_limits(limits(&sandbox));
    if let Some(version) = &sandbox.version {
        runner = runner.with_version(version);
    }

    Ok(WorkflowContext::new(store, generator, runner, collection))
}
