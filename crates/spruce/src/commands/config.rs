//! Config command - show or initialize configuration.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use spruce_config::{
    ConfigSource, OPENAI_API_KEY_ENV, QDRANT_API_KEY_ENV, SpruceConfig, resolve_secret,
    save_config,
};

use super::{Context, print_header, print_json};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write a config file with every default to the user config directory
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    pub force: bool,
}

/// Where each API key would be taken from; never the value itself.
#[derive(Serialize)]
struct SecretReport {
    name: &'static str,
    source: Option<String>,
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    sources: Vec<SourceReport>,
    env_overrides: &'a [String],
    warnings: &'a [String],
    secrets: Vec<SecretReport>,
    config: SpruceConfig,
}

#[derive(Serialize)]
struct SourceReport {
    path: String,
    loaded: bool,
}

impl From<&ConfigSource> for SourceReport {
    fn from(source: &ConfigSource) -> Self {
        Self {
            path: source.path.display().to_string(),
            loaded: source.loaded,
        }
    }
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    if args.init {
        cmd_init(args.force, ctx)
    } else {
        cmd_show(ctx)
    }
}

/// Every section with defaults filled in, secrets redacted.
fn effective(config: &SpruceConfig) -> SpruceConfig {
    SpruceConfig {
        llm: Some(config.effective_llm()),
        embedding: Some(config.effective_embedding()),
        store: Some(config.effective_store()),
        sandbox: Some(config.effective_sandbox()),
        quotation: Some(config.effective_quotation()),
        logging: Some(config.effective_logging()),
    }
    .redacted()
}

fn secrets(config: &SpruceConfig) -> Vec<SecretReport> {
    let source = |env_var: &str, value: Option<String>| {
        resolve_secret(env_var, value.as_deref()).map(|s| s.source.to_string())
    };
    vec![
        SecretReport {
            name: "llm.api_key",
            source: source(OPENAI_API_KEY_ENV, config.effective_llm().api_key),
        },
        SecretReport {
            name: "embedding.api_key",
            source: source(OPENAI_API_KEY_ENV, config.effective_embedding().api_key),
        },
        SecretReport {
            name: "store.api_key",
            source: source(QDRANT_API_KEY_ENV, config.effective_store().api_key),
        },
    ]
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let report = ConfigReport {
        sources: loaded.sources.iter().map(SourceReport::from).collect(),
        env_overrides: &loaded.env_overrides,
        warnings: &loaded.warnings,
        secrets: secrets(&loaded.config),
        config: effective(&loaded.config),
    };

    if ctx.json_output {
        return print_json(&report);
    }

    let dim = Style::new().dim();
    print_header("Spruce Configuration");
    println!();

    println!("Config files (later overrides earlier):");
    for source in &report.sources {
        let status = if source.loaded {
            style("✓ loaded").green().to_string()
        } else {
            dim.apply_to("· not found").to_string()
        };
        println!("  {} {}", status, source.path);
    }
    println!();

    if !report.env_overrides.is_empty() {
        println!("Environment overrides: {}", report.env_overrides.join(", "));
        println!();
    }

    println!("API keys:");
    for secret in &report.secrets {
        match &secret.source {
            Some(source) => println!("  {:<18} {}", secret.name, source),
            None => println!("  {:<18} {}", secret.name, dim.apply_to("not set")),
        }
    }
    println!();

    if let Err(e) = loaded.config.validate() {
        println!("{} {}", style("✗").red(), e);
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for w in report.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    println!("{}", dim.apply_to("---"));
    print!("{}", report.config.to_toml()?);
    Ok(())
}

fn cmd_init(force: bool, ctx: &Context) -> Result<()> {
    let path = match &ctx.config_dir {
        Some(dir) => dir.join("config.toml"),
        None => spruce_config::user_config_path()
            .context("could not determine the user config directory")?,
    };
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    save_config(&SpruceConfig::with_defaults(), &path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if ctx.json_output {
        return print_json(&serde_json::json!({ "path": path.display().to_string() }));
    }
    println!("{} Wrote {}", style("✓").green(), path.display());
    println!(
        "{}",
        Style::new()
            .dim()
            .apply_to(format!("Set {} in the environment rather than in the file.", OPENAI_API_KEY_ENV))
    );
    Ok(())
}
