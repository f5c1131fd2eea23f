//! Execution requests and results.

use serde::{Deserialize, Serialize};

use crate::config::ExecutionLimits;

/// One source file submitted for execution. The first file is the entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

impl SourceFile {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            name: None,
            content: content.into(),
        }
    }
}

/// A program to run in the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    /// Language name or alias, e.g. `python`.
    pub language: String,
    /// Exact runtime version; resolved by the executor when `None`.
    pub version: Option<String>,
    pub files: Vec<SourceFile>,
    pub args: Vec<String>,
    pub stdin: String,
    pub limits: ExecutionLimits,
}

impl ExecutionRequest {
    /// A single-file program with default limits, no arguments, no stdin.
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            version: None,
            files: vec![SourceFile::new(source)],
            args: Vec::new(),
            stdin: String::new(),
            limits: ExecutionLimits::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Content of the entry-point file.
    pub fn source(&self) -> &str {
        self.files.first().map(|f| f.content.as_str()).unwrap_or("")
    }
}

/// Output of one stage (compile or run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    /// Interleaved stdout and stderr.
    #[serde(default)]
    pub output: String,
    /// Exit code; `None` when the process was killed by a signal.
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub signal: Option<String>,
    /// Sandbox status code, e.g. `TO` (timeout) or `SG` (signal), when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RunOutput {
    /// A clean exit with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        let stdout = stdout.into();
        Self {
            output: stdout.clone(),
            stdout,
            code: Some(0),
            ..Self::default()
        }
    }

    /// A failed exit with the given stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self {
            output: stderr.clone(),
            stderr,
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.code == Some(0) && self.signal.is_none()
    }

    pub fn timed_out(&self) -> bool {
        self.status.as_deref() == Some("TO")
    }
}

/// Result of an execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub language: String,
    pub version: String,
    pub run: RunOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<RunOutput>,
}

impl ExecutionOutput {
    pub fn new(language: impl Into<String>, version: impl Into<String>, run: RunOutput) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
            run,
            compile: None,
        }
    }

    /// Combine stdout and stderr for display.
    pub fn combined_output(&self) -> String {
        let run = &self.run;
        if run.stderr.is_empty() {
            run.stdout.clone()
        } else if run.stdout.is_empty() {
            run.stderr.clone()
        } else {
            format!("{}\n\n--- stderr ---\n{}", run.stdout, run.stderr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ExecutionRequest::new("python", "print(1)")
            .with_version("3.10.0")
            .with_stdin("input")
            .with_args(vec!["-v".to_string()]);

        assert_eq!(request.source(), "print(1)");
        assert_eq!(request.version.as_deref(), Some("3.10.0"));
        assert_eq!(request.files.len(), 1);
        assert_eq!(request.args, vec!["-v"]);
    }

    #[test]
    fn test_run_output_status() {
        assert!(RunOutput::success("ok").succeeded());
        assert!(!RunOutput::failure(1, "Traceback").succeeded());

        let killed = RunOutput {
            signal: Some("SIGKILL".to_string()),
            status: Some("TO".to_string()),
            ..RunOutput::default()
        };
        assert!(!killed.succeeded());
        assert!(killed.timed_out());
    }

    #[test]
    fn test_parse_piston_run_with_null_code() {
        let run: RunOutput = serde_json::from_str(
            r#"{"stdout":"","stderr":"","output":"","code":null,"signal":"SIGKILL"}"#,
        )
        .unwrap();
        assert_eq!(run.code, None);
        assert_eq!(run.signal.as_deref(), Some("SIGKILL"));
    }

    #[test]
    fn test_combined_output() {
        let mut output = ExecutionOutput::new("python", "3.10.0", RunOutput::success("out"));
        assert_eq!(output.combined_output(), "out");

        output.run.stderr = "err".to_string();
        assert_eq!(output.combined_output(), "out\n\n--- stderr ---\nerr");
    }
}
