//! Remote code execution for untrusted programs.
//!
//! This crate submits programs to a [Piston](https://github.com/engineer-man/piston)
//! instance and returns their output. Nothing generated by a model ever runs
//! in this process.
//!
//! # Security Model
//!
//! - **Isolation**: code runs in the remote sandbox's container, never locally
//! - **Limits**: every request carries explicit run/compile timeouts and an
//!   optional memory cap ([`ExecutionLimits`])
//! - **Deadline**: the HTTP round-trip is bounded by the limits plus a grace period
//!
//! # Example
//!
//! ```no_run
//! use spruce_sandbox::{CodeExecutor, ExecutionRequest, PistonConfig, PistonExecutor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = PistonExecutor::new(PistonConfig::from_env())?;
//!     let output = executor
//!         .execute(ExecutionRequest::new("python", "print('hello')"))
//!         .await?;
//!     println!("Output: {}", output.run.stdout);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod executor;
mod piston;
mod types;

pub use config::{DEFAULT_PISTON_URL, ExecutionLimits, PistonConfig};
pub use error::{SandboxError, SandboxResult};
pub use executor::{CodeExecutor, MockExecutor, SharedExecutor};
pub use piston::{PistonExecutor, Runtime};
pub use types::{ExecutionOutput, ExecutionRequest, RunOutput, SourceFile};
