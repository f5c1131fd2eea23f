//! Spruce - back office for a cleaning company
//!
//! Main entry point for the Spruce CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

mod commands;
mod services;

use commands::{config, ingest, quote, rules, run, schedule, search};

const CONSOLE_FILTER: &str = "spruce=info,spruce_pipeline=info,spruce_store=info,spruce_sandbox=info,warn";
const VERBOSE_FILTER: &str = "spruce=debug,spruce_pipeline=debug,spruce_llm=debug,spruce_store=debug,spruce_sandbox=debug,spruce_config=debug,info";
const FILE_FILTER: &str = "spruce=trace,spruce_pipeline=trace,spruce_llm=debug,spruce_store=debug,spruce_sandbox=debug,spruce_config=debug,info";

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Spruce - quotations and booking validation for a cleaning company
#[derive(Parser)]
#[command(name = "spruce")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// User config directory (default: platform config dir, or SPRUCE_CONFIG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Use an in-memory store seeded with the demo documents and a mock embedder
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seed the document collection
    Ingest(ingest::IngestArgs),

    /// Draft a quotation for a cleaning request
    Quote(quote::QuoteArgs),

    /// Validate a booking request against the scheduling rules
    Schedule(schedule::ScheduleArgs),

    /// Similarity search over the knowledge base
    Search(search::SearchArgs),

    /// List the stored scheduling rules
    Rules(rules::RulesArgs),

    /// Execute a script file in the sandbox
    Run(run::RunArgs),

    /// Show the resolved configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = spruce_config::load_config_with_options(None, cli.config.as_deref())
        .context("failed to load configuration")?;

    let logging = loaded.config.effective_logging();
    let log_dir = logging
        .dir
        .clone()
        .or_else(|| {
            cli.config
                .clone()
                .or_else(spruce_config::user_config_dir)
                .map(|d| d.join("logs"))
        })
        .unwrap_or_else(|| PathBuf::from("logs"));
    let _guard = init_tracing(cli.verbose, &log_dir, logging.file_filter.as_deref());

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        offline: cli.offline,
        config_dir: cli.config,
        loaded,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Ingest(args) => ingest::run(args, &ctx).await,
        Commands::Quote(args) => quote::run(args, &ctx).await,
        Commands::Schedule(args) => schedule::run(args, &ctx).await,
        Commands::Search(args) => search::run(args, &ctx).await,
        Commands::Rules(args) => rules::run(args, &ctx).await,
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console (human-readable, stderr) + rotating JSON file.
///
/// The file layer is skipped when the log directory cannot be created.
fn init_tracing(verbose: bool, log_dir: &Path, file_filter: Option<&str>) -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { CONSOLE_FILTER })
    });

    let (file_layer, guard) = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("spruce.log")
        .build(log_dir)
    {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_filter.unwrap_or(FILE_FILTER)));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}
