//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/spruce/config.toml` (user config, or `$SPRUCE_CONFIG_DIR/config.toml`)
//! 2. `./spruce.toml` (project-local)
//! 3. Environment overrides (`QDRANT_URL`, `QDRANT_COLLECTION`, `PISTON_URL`)
//!
//! API keys are not copied into the config; see [`crate::secrets`].

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, SpruceConfig};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "spruce.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "spruce";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "SPRUCE_CONFIG_DIR";

/// Environment variables that override config values.
pub const QDRANT_URL_ENV: &str = "QDRANT_URL";
pub const QDRANT_COLLECTION_ENV: &str = "QDRANT_COLLECTION";
pub const PISTON_URL_ENV: &str = "PISTON_URL";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: SpruceConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Environment variables that overrode file values.
    pub env_overrides: Vec<String>,
    /// Warnings generated during loading (e.g., plaintext API keys).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `SPRUCE_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = load_files(project_dir, config_dir)?;
    loaded.env_overrides = apply_env_overrides(&mut loaded.config, |name| {
        std::env::var(name).ok()
    });
    Ok(loaded)
}

/// Discover and merge config files without consulting the environment.
pub fn load_files(project_dir: Option<&Path>, config_dir: Option<&Path>) -> Result<LoadedConfig> {
    let mut config = SpruceConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings)?);
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings)?);

    check_plaintext_keys(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        env_overrides: Vec::new(),
        warnings,
    })
}

/// Apply environment overrides; returns the names of the variables used.
pub fn apply_env_overrides<F>(config: &mut SpruceConfig, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();
    let mut take = |name: &str| {
        let value = lookup(name).filter(|v| !v.is_empty())?;
        applied.push(name.to_string());
        Some(value)
    };

    if let Some(url) = take(QDRANT_URL_ENV) {
        config.store.get_or_insert_with(Default::default).url = url;
    }
    if let Some(collection) = take(QDRANT_COLLECTION_ENV) {
        config.store.get_or_insert_with(Default::default).collection = collection;
    }
    if let Some(url) = take(PISTON_URL_ENV) {
        config.sandbox.get_or_insert_with(Default::default).base_url = url;
    }

    if !applied.is_empty() {
        tracing::debug!(vars = ?applied, "Applied environment overrides");
    }
    applied
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<SpruceConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    SpruceConfig::from_toml(&contents)
}

/// Save configuration to a file.
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &SpruceConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Path of the user config file.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The user config directory.
///
/// Checks `SPRUCE_CONFIG_DIR` first, then falls back to the platform default
/// (`~/.config/spruce` on Linux, `~/Library/Application Support/spruce` on macOS).
pub fn user_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(
    config: &mut SpruceConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<ConfigSource> {
    if !path.is_file() {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        });
    }

    match load_config_file(path) {
        Ok(layer) => {
            tracing::debug!(path = %path.display(), "Loaded config layer");
            config.merge(layer);
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            })
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            })
        }
    }
}

fn check_plaintext_keys(config: &SpruceConfig, warnings: &mut Vec<String>) {
    for section in config.plaintext_key_sections() {
        warnings.push(format!(
            "[{}] contains a plaintext API key. \
             Consider using an environment variable instead.",
            section
        ));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_user_config_path() {
        if let Some(p) = user_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let loaded = load_files(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.config, SpruceConfig::default());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
    }

    #[test]
    fn test_project_overrides_user() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            user.path().join("config.toml"),
            r#"
[llm]
model = "user-model"

[store]
collection = "user-collection"
"#,
        )
        .unwrap();
        fs::write(
            project.path().join("spruce.toml"),
            r#"
[store]
collection = "project-collection"
"#,
        )
        .unwrap();

        let loaded = load_files(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.config.effective_llm().model, "user-model");
        assert_eq!(loaded.config.effective_store().collection, "project-collection");
        assert_eq!(loaded.loaded_from().len(), 2);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_malformed_config_warns_but_continues() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("spruce.toml"), "not valid toml {{{{").unwrap();

        let loaded = load_files(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
    }

    #[test]
    fn test_plaintext_key_warning() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(
            project.path().join("spruce.toml"),
            r#"
[llm]
api_key = "sk-secret"

[store]
api_key = "qdrant-secret"
"#,
        )
        .unwrap();

        let loaded = load_files(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.warnings.len(), 2);
        assert!(loaded.warnings[0].contains("[llm]"));
        assert!(loaded.warnings[1].contains("[store]"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SpruceConfig::from_toml("[store]\nvector_size = 1536").unwrap();
        let applied = apply_env_overrides(&mut config, |name| match name {
            "QDRANT_URL" => Some("https://qdrant.example.com:6333".to_string()),
            "PISTON_URL" => Some("http://localhost:2000/api/v2".to_string()),
            "QDRANT_COLLECTION" => Some(String::new()),
            _ => None,
        });

        assert_eq!(applied, vec!["QDRANT_URL", "PISTON_URL"]);
        let store = config.effective_store();
        assert_eq!(store.url, "https://qdrant.example.com:6333");
        assert_eq!(store.collection, "spruce");
        assert_eq!(config.effective_sandbox().base_url, "http://localhost:2000/api/v2");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = SpruceConfig::with_defaults();

        save_config(&config, &path).unwrap();
        assert_eq!(load_config_file(&path).unwrap(), config);
    }
}
