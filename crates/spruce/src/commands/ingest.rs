//! Ingest command - seed the document collection.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use spruce_pipeline::seed::demo_documents;
use spruce_pipeline::{ingest, ingest_unchecked, load_documents};

use super::{Context, print_json};
use crate::services;

/// Arguments for the ingest command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON file of `[{"content": ..., "metadata": {...}}]` (default: built-in demo documents)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Add the documents even if the collection already holds some
    #[arg(long)]
    pub force: bool,
}

/// Run the ingest command.
pub async fn run(args: IngestArgs, ctx: &Context) -> Result<()> {
    let docs = match &args.file {
        Some(path) => load_documents(path)?,
        None => demo_documents(),
    };
    let (store, collection) = services::store(ctx).await?;

    let report = if args.force {
        ingest_unchecked(store.as_ref(), &collection, &docs).await
    } else {
        ingest(store.as_ref(), &collection, &docs).await
    }
    .with_context(|| format!("failed to ingest into '{}'", collection))?;

    if ctx.json_output {
        return print_json(&report);
    }

    let dim = Style::new().dim();
    if report.skipped {
        println!(
            "{} Collection '{}' already has documents, nothing written",
            dim.apply_to("·"),
            report.collection
        );
        println!("{}", dim.apply_to("  (use --force to add them anyway)"));
    } else {
        let created = if report.collection_created {
            " (collection created)"
        } else {
            ""
        };
        println!(
            "{} Added {} document(s) to '{}'{}",
            style("✓").green(),
            style(report.added).cyan(),
            report.collection,
            created
        );
    }
    Ok(())
}
