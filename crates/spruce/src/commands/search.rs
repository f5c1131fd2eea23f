//! Search command - similarity search over the knowledge base.

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use spruce_store::{DocumentStore, Filter};

use super::{Context, print_header, print_json, truncate};
use crate::services;

/// Arguments for the search command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum results to return
    #[arg(short, default_value = "4")]
    pub k: usize,

    /// Include scheduling-rule documents in the results
    #[arg(long)]
    pub include_rules: bool,
}

#[derive(Serialize)]
struct SearchHit<'a> {
    score: f32,
    content: &'a str,
    source: Option<&'a str>,
    scheduling_rule: bool,
}

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let (store, collection) = services::store(ctx).await?;
    let filter = (!args.include_rules).then(Filter::exclude_scheduling_rules);

    let results = store
        .similarity_search(&args.query, args.k, &collection, filter.as_ref())
        .await
        .with_context(|| format!("search in '{}' failed", collection))?;

    if ctx.json_output {
        let hits: Vec<SearchHit<'_>> = results
            .iter()
            .map(|r| SearchHit {
                score: r.score,
                content: &r.document.content,
                source: r.document.source(),
                scheduling_rule: r.document.is_scheduling_rule(),
            })
            .collect();
        return print_json(&hits);
    }

    let dim = Style::new().dim();
    if results.is_empty() {
        println!("{}", dim.apply_to("No results found"));
        return Ok(());
    }

    print_header("Search Results");
    println!();
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {}",
            style(i + 1).cyan(),
            truncate(&result.document.content, 70)
        );
        let mut detail = format!("(score: {:.3})", result.score);
        if let Some(source) = result.document.source() {
            detail.push_str(&format!(" source: {}", source));
        }
        println!("   {}", dim.apply_to(detail));
        println!();
    }
    Ok(())
}
