//! Quote command - draft a quotation for a cleaning request.

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use spruce_pipeline::{QuotationSettings, QuotationWorkflow};

use super::{Context, print_header, print_json};
use crate::services;

/// Arguments for the quote command.
#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// The customer's request (default: `[quotation] request` from config)
    pub request: Option<String>,

    /// Maximum number of services to price
    #[arg(long)]
    pub max_services: Option<usize>,
}

/// Run the quote command.
pub async fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let config = ctx.config();
    config.validate().context("invalid configuration")?;

    let quotation = config.effective_quotation();
    let llm = config.effective_llm();
    let request = args.request.unwrap_or(quotation.request);

    let mut settings = QuotationSettings::new(config.effective_store().collection)
        .with_model(llm.model)
        .with_max_tokens(llm.max_tokens)
        .with_knowledge_results(quotation.knowledge_results)
        .with_max_services(args.max_services.unwrap_or(quotation.max_services).max(1));
    if let Some(url) = quotation.service_image_url {
        settings = settings.with_service_image(url);
    }

    let (store, _) = services::store(ctx).await?;
    let workflow = QuotationWorkflow::new(store, services::backend(ctx)?, settings);

    if ctx.verbose {
        let dim = Style::new().dim();
        println!("{}", dim.apply_to(format!("Quoting: \"{}\"", request)));
        println!();
    }

    let state = workflow
        .run(&request)
        .await
        .context("quotation workflow failed")?;

    if ctx.json_output {
        return print_json(&state);
    }

    print_header("Quotation");
    println!("Status:  {}", style(state.status).cyan());
    println!("Request: {}", state.user_input);
    println!();
    if ctx.verbose && !state.knowledge_base.is_empty() {
        println!("{}", style("Context").bold());
        for line in state.knowledge_base.lines() {
            println!("  {}", Style::new().dim().apply_to(line));
        }
        println!();
    }
    println!("{}", state.final_quotation);
    Ok(())
}
