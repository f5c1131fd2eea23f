//! Secret resolution with provenance.
//!
//! Resolution order:
//! 1. Environment variable
//! 2. Config file (with warning)

use crate::{ConfigError, Result};

/// Environment variable for the OpenAI chat and embedding key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable for the Qdrant key.
pub const QDRANT_API_KEY_ENV: &str = "QDRANT_API_KEY";

/// Result of secret resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    pub value: String,
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve a secret from the process environment, then the config value.
pub fn resolve_secret(env_var: &str, config_value: Option<&str>) -> Option<ResolvedSecret> {
    resolve_secret_with(|name| std::env::var(name).ok(), env_var, config_value)
}

/// Same as [`resolve_secret`] with an injectable environment lookup.
pub fn resolve_secret_with<F>(
    lookup: F,
    env_var: &str,
    config_value: Option<&str>,
) -> Option<ResolvedSecret>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(env_var)
        && !value.is_empty()
    {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(env_var.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}

/// Like [`resolve_secret`], but a missing secret is an error.
pub fn require_secret(
    name: &str,
    env_var: &str,
    config_value: Option<&str>,
) -> Result<ResolvedSecret> {
    resolve_secret(env_var, config_value).ok_or_else(|| ConfigError::MissingSecret {
        name: name.to_string(),
        env_var: env_var.to_string(),
    })
}
