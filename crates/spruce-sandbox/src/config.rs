//! Sandbox configuration.

use std::time::Duration;

/// Public Piston instance.
pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston";

/// Resource limits sent with every execution request.
///
/// # Security Model
///
/// Generated code is untrusted. Every request carries explicit run/compile
/// timeouts and (optionally) a memory cap instead of relying on whatever the
/// sandbox instance defaults to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Wall-clock limit for the run stage.
    pub run_timeout: Duration,

    /// Wall-clock limit for the compile stage (compiled languages only).
    pub compile_timeout: Duration,

    /// Memory cap for the run stage, in bytes. `None` sends no cap.
    pub memory_limit_bytes: Option<u64>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_millis(3_000),
            compile_timeout: Duration::from_millis(10_000),
            memory_limit_bytes: None,
        }
    }
}

impl ExecutionLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }

    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit_bytes = Some(bytes);
        self
    }
}

/// Configuration for [`PistonExecutor`](crate::PistonExecutor).
#[derive(Debug, Clone)]
pub struct PistonConfig {
    /// Base URL of the Piston API (up to and including `/piston`).
    pub base_url: String,

    /// Runtime version to request when a request names none.
    /// `None` resolves the newest installed version.
    pub default_version: Option<String>,

    /// Added to the run and compile timeouts to bound the HTTP round-trip.
    pub request_grace: Duration,
}

impl Default for PistonConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PISTON_URL.to_string(),
            default_version: None,
            request_grace: Duration::from_secs(10),
        }
    }
}

impl PistonConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Read `PISTON_URL`, falling back to the public instance.
    pub fn from_env() -> Self {
        match std::env::var("PISTON_URL") {
            Ok(url) if !url.is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    pub fn with_request_grace(mut self, grace: Duration) -> Self {
        self.request_grace = grace;
        self
    }
}
