//! Schedule command - validate a booking request.

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use spruce_pipeline::{SchedulingStatus, SchedulingWorkflow};

use super::{Context, print_header, print_json};
use crate::services;

/// Arguments for the schedule command.
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// The customer's booking request, in their own words
    pub inquiry: String,

    /// Print the generated validator and extractor
    #[arg(long)]
    pub show_code: bool,
}

/// Run the schedule command.
pub async fn run(args: ScheduleArgs, ctx: &Context) -> Result<()> {
    let workflow = SchedulingWorkflow::new(services::workflow_context(ctx).await?);
    let outcome = workflow
        .run(&args.inquiry)
        .await
        .context("scheduling workflow failed")?;

    if ctx.json_output {
        return print_json(&outcome);
    }

    let dim = Style::new().dim();
    print_header("Booking Validation");
    let status = match outcome.status {
        SchedulingStatus::ValidationPassed => style(outcome.status).green(),
        SchedulingStatus::ValidationFailed => style(outcome.status).red(),
        SchedulingStatus::Pending => style(outcome.status).yellow(),
    };
    println!("Status: {}", status);
    println!("{}", dim.apply_to(format!("run {}", outcome.run_id)));
    println!();

    if outcome.validation_errors.is_empty() {
        println!("{} No rule violations", style("✓").green());
    } else {
        println!("{}", style("Violations").bold());
        for error in &outcome.validation_errors {
            println!("  {} {}", style("✗").red(), error);
        }
    }

    if ctx.verbose {
        println!();
        println!("{}", style("Rules checked").bold());
        for rule in &outcome.state.scheduling_rules {
            println!("  {}", dim.apply_to(rule));
        }
    }

    if args.show_code {
        println!();
        println!("{}", style("Validator").bold());
        println!("{}", outcome.state.python_validation_method);
        println!();
        println!("{}", style("Extractor").bold());
        println!("{}", outcome.state.python_parameters_extraction_method);
    }
    Ok(())
}
