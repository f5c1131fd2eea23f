//! Run command - execute a script file in the sandbox.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::{Style, style};
use spruce_sandbox::{CodeExecutor, ExecutionRequest};

use super::{Context, print_json};
use crate::services;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source file to execute
    pub file: PathBuf,

    /// Runtime language (default: `[sandbox] language` from config)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Runtime version (default: newest installed)
    #[arg(long)]
    pub runtime_version: Option<String>,

    /// Arguments passed to the program
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Run the run command.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    if source.trim().is_empty() {
        bail!("{} is empty", args.file.display());
    }

    let sandbox = ctx.config().effective_sandbox();
    let language = args.language.unwrap_or_else(|| sandbox.language.clone());
    let mut request = ExecutionRequest::new(&language, source)
        .with_limits(services::limits(&sandbox))
        .with_args(args.args);
    if let Some(version) = args.runtime_version.or_else(|| sandbox.version.clone()) {
        request = request.with_version(version);
    }

    let executor = services::executor(ctx)?;
    let output = executor
        .execute(request)
        .await
        .with_context(|| format!("sandbox execution of {} failed", args.file.display()))?;

    if ctx.json_output {
        return print_json(&output);
    }

    let dim = Style::new().dim();
    if ctx.verbose {
        eprintln!(
            "{}",
            dim.apply_to(format!("{} {}", output.language, output.version))
        );
    }
    if let Some(compile) = &output.compile
        && !compile.succeeded()
    {
        eprint!("{}", style(&compile.stderr).red());
        bail!("compilation failed");
    }
    print!("{}", output.run.stdout);
    if !output.run.stderr.is_empty() {
        eprint!("{}", style(&output.run.stderr).red());
    }
    if !output.run.succeeded() {
        let reason = match (output.run.code, &output.run.signal) {
            _ if output.run.timed_out() => "timed out".to_string(),
            (Some(code), _) => format!("exit code {}", code),
            (None, Some(signal)) => format!("killed by {}", signal),
            (None, None) => "failed".to_string(),
        };
        bail!("program {}", reason);
    }
    Ok(())
}
