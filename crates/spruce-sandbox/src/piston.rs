//! Piston execution API client.
//!
//! Piston runs each request in a fresh, network-isolated container. Runtime
//! versions are looked up once via `GET /runtimes` and cached.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::PistonConfig;
use crate::error::{SandboxError, SandboxResult};
use crate::executor::CodeExecutor;
use crate::types::{ExecutionOutput, ExecutionRequest, SourceFile};

/// An installed Piston runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Runtime {
    pub language: String,
    pub version: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Runtime {
    fn serves(&self, language: &str) -> bool {
        self.language.eq_ignore_ascii_case(language)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(language))
    }
}

/// [`CodeExecutor`] backed by a Piston instance.
pub struct PistonExecutor {
    http: Client,
    config: PistonConfig,
    runtimes: OnceCell<Vec<Runtime>>,
}

impl PistonExecutor {
    pub fn new(config: PistonConfig) -> SandboxResult<Self> {
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(SandboxError::Config(format!(
                "Piston base URL must be http(s): {}",
                config.base_url
            )));
        }

        // Per-request timeouts are set in `execute`; this only bounds lookups.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            config,
            runtimes: OnceCell::new(),
        })
    }

    /// Installed runtimes, fetched on first use.
    pub async fn runtimes(&self) -> SandboxResult<&[Runtime]> {
        let runtimes = self
            .runtimes
            .get_or_try_init(|| async {
                let response = self
                    .http
                    .get(format!("{}/runtimes", self.config.base_url))
                    .timeout(self.config.request_grace)
                    .send()
                    .await?;
                let runtimes: Vec<Runtime> = Self::handle_response(response).await?;
                tracing::debug!(count = runtimes.len(), "Fetched sandbox runtimes");
                Ok::<_, SandboxError>(runtimes)
            })
            .await?;
        Ok(runtimes)
    }

    /// Newest installed version serving `language` (name or alias).
    pub async fn resolve_version(&self, language: &str) -> SandboxResult<String> {
        self.runtimes()
            .await?
            .iter()
            .filter(|r| r.serves(language))
            .max_by(|a, b| compare_versions(&a.version, &b.version))
            .map(|r| r.version.clone())
            .ok_or_else(|| SandboxError::RuntimeNotFound {
                language: language.to_string(),
            })
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(response: Response) -> SandboxResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<PistonErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(SandboxError::Api {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| SandboxError::InvalidResponse(e.to_string()))
    }
}

impl std::fmt::Debug for PistonExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PistonExecutor")
            .field("base_url", &self.config.base_url)
            .field("default_version", &self.config.default_version)
            .finish()
    }
}

#[async_trait]
impl CodeExecutor for PistonExecutor {
    async fn execute(&self, request: ExecutionRequest) -> SandboxResult<ExecutionOutput> {
        let version = match request.version.clone().or_else(|| self.config.default_version.clone()) {
            Some(version) => version,
            None => self.resolve_version(&request.language).await?,
        };

        let limits = request.limits;
        let body = PistonExecuteRequest {
            language: &request.language,
            version: &version,
            files: &request.files,
            args: &request.args,
            stdin: &request.stdin,
            run_timeout: limits.run_timeout.as_millis() as u64,
            compile_timeout: limits.compile_timeout.as_millis() as u64,
            run_memory_limit: limits.memory_limit_bytes,
        };

        // Covers both stages plus network slack.
        let deadline = limits.run_timeout + limits.compile_timeout + self.config.request_grace;

        tracing::debug!(
            language = %request.language,
            version = %version,
            bytes = request.source().len(),
            run_timeout_ms = body.run_timeout,
            "Submitting code to sandbox"
        );

        let response = self
            .http
            .post(format!("{}/execute", self.config.base_url))
            .timeout(deadline)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SandboxError::Timeout(deadline)
                } else {
                    SandboxError::Http(e)
                }
            })?;

        let output: ExecutionOutput = Self::handle_response(response).await?;

        if output.run.timed_out() {
            return Err(SandboxError::Timeout(limits.run_timeout));
        }

        tracing::debug!(
            code = ?output.run.code,
            signal = ?output.run.signal,
            stdout_bytes = output.run.stdout.len(),
            stderr_bytes = output.run.stderr.len(),
            "Sandbox run finished"
        );
        Ok(output)
    }

    fn name(&self) -> &str {
        "piston"
    }
}

/// Order dotted version strings numerically, e.g. `3.10.0 > 3.9.4`.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.split(['.', '-', '+'])
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    };
    parse(a).cmp(&parse(b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Piston API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PistonExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: &'a [SourceFile],
    args: &'a [String],
    stdin: &'a str,
    run_timeout: u64,
    compile_timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_memory_limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PistonErrorBody {
    message: String,
}
