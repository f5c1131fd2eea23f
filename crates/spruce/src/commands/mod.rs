//! CLI command handlers.

use std::path::PathBuf;

use anyhow::Result;
use console::Style;
use serde::Serialize;
use spruce_config::{LoadedConfig, SpruceConfig};

pub mod config;
pub mod ingest;
pub mod quote;
pub mod rules;
pub mod run;
pub mod schedule;
pub mod search;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// In-memory store and mock embedder instead of the configured services.
    pub offline: bool,
    /// User config directory override.
    pub config_dir: Option<PathBuf>,
    /// Configuration after file discovery and environment overrides.
    pub loaded: LoadedConfig,
}

impl Context {
    pub fn config(&self) -> &SpruceConfig {
        &self.loaded.config
    }
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a bold title and a dim rule under it.
pub fn print_header(title: &str) {
    println!("{}", Style::new().bold().apply_to(title));
    println!("{}", Style::new().dim().apply_to("─".repeat(50)));
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 10), "a longe...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }
}
