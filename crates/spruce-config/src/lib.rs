//! Configuration system for the Spruce back office.
//!
//! Provides TOML-based configuration with:
//! - One optional section per collaborator (`[llm]`, `[embedding]`, `[store]`, `[sandbox]`)
//! - Workflow defaults (`[quotation]`) and file logging (`[logging]`)
//! - Config file layering (user config + project-local overrides + environment)
//! - API key resolution (env var → config file) with provenance

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, apply_env_overrides, load_config, load_config_file,
    load_config_with_options, load_files, save_config, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{
    OPENAI_API_KEY_ENV, QDRANT_API_KEY_ENV, ResolvedSecret, SecretSource, require_secret,
    resolve_secret,
};
pub use types::*;
