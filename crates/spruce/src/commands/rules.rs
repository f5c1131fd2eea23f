//! Rules command - list the stored scheduling rules.

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use spruce_pipeline::extract_rules;

use super::{Context, print_header, print_json};
use crate::services;

/// Arguments for the rules command.
#[derive(Args, Debug)]
pub struct RulesArgs {}

/// Run the rules command.
pub async fn run(_args: RulesArgs, ctx: &Context) -> Result<()> {
    let (store, collection) = services::store(ctx).await?;
    let rules = extract_rules(store.as_ref(), &collection)
        .await
        .with_context(|| format!("failed to read rules from '{}'", collection))?;

    if ctx.json_output {
        return print_json(&rules);
    }

    if rules.is_empty() {
        println!(
            "{}",
            Style::new()
                .dim()
                .apply_to(format!("No scheduling rules in '{}'", collection))
        );
        return Ok(());
    }

    print_header("Scheduling Rules");
    for (i, rule) in rules.iter().enumerate() {
        println!("{}. {}", style(i + 1).cyan(), rule);
    }
    Ok(())
}
