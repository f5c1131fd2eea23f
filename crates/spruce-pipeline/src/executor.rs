//! Validation script assembly, execution and result parsing.
//!
//! Generated snippets are untrusted text. Before anything is sent to the
//! sandbox both are checked for the expected top-level function and
//! parameter list; the assembled script only ever runs remotely.

use serde_json::Value;
use spruce_sandbox::{ExecutionLimits, ExecutionOutput, ExecutionRequest, SharedExecutor};

use crate::error::{ExecutionError, Result};
use crate::prompts::{EXTRACTOR_FUNCTION, EXTRACTOR_KEYS, VALIDATOR_FUNCTION, VALIDATOR_PARAMETERS};

/// Language of the assembled script.
pub const SCRIPT_LANGUAGE: &str = "python";

const PREAMBLE: &str = "import sys\nimport datetime\nimport calendar\nimport json\n";

// ─────────────────────────────────────────────────────────────────────────────
// Snippet checks
// ─────────────────────────────────────────────────────────────────────────────

/// Drop one leading and one trailing Markdown code fence, if present.
pub fn strip_code_fence(snippet: &str) -> &str {
    let mut code = snippet.trim();
    if code.starts_with("```") {
        code = match code.find('\n') {
            Some(end) => &code[end + 1..],
            None => "",
        };
    }
    if let Some(body) = code.trim_end().strip_suffix("```") {
        code = body;
    }
    code.trim_matches('\n')
}

/// Parameter names of the top-level `def name(...)` in `code`.
///
/// Annotations and default values are dropped. `None` when no such
/// definition starts at column zero.
fn top_level_parameters(code: &str, name: &str) -> Option<Vec<String>> {
    let header = format!("def {}", name);
    let mut offset = 0;
    let start = loop {
        let line = &code[offset..];
        if let Some(rest) = line.strip_prefix(&header)
            && rest.trim_start().starts_with('(')
        {
            break offset + header.len() + (rest.len() - rest.trim_start().len()) + 1;
        }
        offset += line.find('\n')? + 1;
    };

    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in code[start..].char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => {
                end = Some(start + i);
                break;
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    let list = &code[start..end?];

    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    params.push(current);

    Some(
        params
            .iter()
            .map(|p| {
                p.split([':', '='])
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            })
            .filter(|p| !p.is_empty())
            .collect(),
    )
}

/// Check that the validator defines the seven-parameter validation function.
pub fn check_validator(snippet: &str) -> std::result::Result<(), ExecutionError> {
    let params = top_level_parameters(snippet, VALIDATOR_FUNCTION).ok_or_else(|| {
        ExecutionError::Contract(format!("validator does not define `{}`", VALIDATOR_FUNCTION))
    })?;
    if params != VALIDATOR_PARAMETERS {
        return Err(ExecutionError::Contract(format!(
            "`{}` takes ({}), expected ({})",
            VALIDATOR_FUNCTION,
            params.join(", "),
            VALIDATOR_PARAMETERS.join(", ")
        )));
    }
    Ok(())
}

/// Check that the extractor defines the argument-less extraction function.
pub fn check_extractor(snippet: &str) -> std::result::Result<(), ExecutionError> {
    let params = top_level_parameters(snippet, EXTRACTOR_FUNCTION).ok_or_else(|| {
        ExecutionError::Contract(format!("extractor does not define `{}`", EXTRACTOR_FUNCTION))
    })?;
    if !params.is_empty() {
        return Err(ExecutionError::Contract(format!(
            "`{}` must take no arguments, found ({})",
            EXTRACTOR_FUNCTION,
            params.join(", ")
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Script
// ─────────────────────────────────────────────────────────────────────────────

/// Concatenate the preamble, both snippets and the driver into one script.
///
/// Snippets are fence-stripped and contract-checked first.
pub fn assemble_script(
    validator: &str,
    extractor: &str,
) -> std::result::Result<String, ExecutionError> {
    let validator = strip_code_fence(validator);
    let extractor = strip_code_fence(extractor);
    check_validator(validator)?;
    check_extractor(extractor)?;

    let arguments = EXTRACTOR_KEYS
        .iter()
        .map(|key| format!("parameters.get(\"{}\")", key))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "{PREAMBLE}\n{validator}\n\n{extractor}\n\n\
         parameters = {EXTRACTOR_FUNCTION}()\n\n\
         validation_errors = {VALIDATOR_FUNCTION}({arguments})\n\n\
         print(json.dumps({{\"validation_errors\": validation_errors}}))\n"
    ))
}

/// Read the validation error list out of a finished run.
///
/// The JSON envelope is normally the whole of stdout; if the generated code
/// printed anything else, the last line is tried.
pub fn parse_output(output: &ExecutionOutput) -> std::result::Result<Vec<String>, ExecutionError> {
    let stdout = output.run.stdout.trim();
    if stdout.is_empty() {
        if output.run.succeeded() {
            return Err(ExecutionError::EmptyOutput);
        }
        return Err(ExecutionError::ScriptFailed {
            code: output.run.code,
            stderr: output.run.stderr.trim().to_string(),
        });
    }

    let value: Value = match serde_json::from_str(stdout) {
        Ok(value) => value,
        Err(e) => match stdout
            .lines()
            .next_back()
            .and_then(|line| serde_json::from_str(line.trim()).ok())
        {
            Some(value) => value,
            // A crash after a stray print: report the crash, not the print.
            None if !output.run.succeeded() => {
                return Err(ExecutionError::ScriptFailed {
                    code: output.run.code,
                    stderr: output.run.stderr.trim().to_string(),
                });
            }
            None => return Err(ExecutionError::MalformedOutput(e.to_string())),
        },
    };

    let errors = value
        .get("validation_errors")
        .and_then(Value::as_array)
        .ok_or(ExecutionError::MissingErrors)?;
    errors
        .iter()
        .map(|e| e.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or(ExecutionError::MissingErrors)
}

// ─────────────────────────────────────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────────────────────────────────────

/// Runs validator + extractor pairs in the sandbox.
#[derive(Clone)]
pub struct ValidationRunner {
    executor: SharedExecutor,
    version: Option<String>,
    limits: ExecutionLimits,
}

impl ValidationRunner {
    pub fn new(executor: SharedExecutor) -> Self {
        Self {
            executor,
            version: None,
            limits: ExecutionLimits::default(),
        }
    }

    /// Pin the Python runtime version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// Assemble, execute and parse. Returns the validation errors, in order.
    pub async fn run(&self, validator: &str, extractor: &str) -> Result<Vec<String>> {
        let script = assemble_script(validator, extractor)?;

        let mut request = ExecutionRequest::new(SCRIPT_LANGUAGE, script).with_limits(self.limits);
        if let Some(version) = &self.version {
            request = request.with_version(version.clone());
        }

        let output = self.executor.execute(request).await?;
        tracing::debug!(
            executor = self.executor.name(),
            code = ?output.run.code,
            stdout = %output.run.stdout.trim(),
            "Validation script finished"
        );
        if !output.run.stderr.is_empty() {
            tracing::debug!(stderr = %output.run.stderr, "Validation script stderr");
        }

        Ok(parse_output(&output)?)
    }
}

impl std::fmt::Debug for ValidationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRunner")
            .field("executor", &self.executor.name())
            .field("version", &self.version)
            .field("limits", &self.limits)
            .finish()
    }
}
