//! Quotation and scheduling-validation workflows.
//!
//! Each workflow is a short chain of remote calls (document store, language
//! model, code sandbox) orchestrated with plain async joins.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  SchedulingWorkflow                                      │
//! │  - rules (store scroll) ─► CodeGenerator (validator)     │
//! │  - CodeGenerator (extractor)          } tokio::try_join! │
//! │  - ValidationRunner: check, assemble, execute, parse     │
//! ├──────────────────────────────────────────────────────────┤
//! │  QuotationWorkflow                                       │
//! │  - similarity search ─► services ─► pricing fan-out      │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod codegen;
pub mod error;
pub mod executor;
pub mod prompts;
pub mod quotation;
pub mod rules;
pub mod scheduling;
pub mod seed;
pub mod state;

pub use codegen::CodeGenerator;
pub use error::{ExecutionError, Result, WorkflowError};
pub use executor::{ValidationRunner, assemble_script, parse_output, strip_code_fence};
pub use quotation::{QuotationSettings, QuotationState, QuotationStatus, QuotationWorkflow};
pub use rules::extract_rules;
pub use scheduling::{SchedulingOutcome, SchedulingWorkflow, WorkflowContext};
pub use seed::{IngestReport, ingest, ingest_unchecked, load_documents};
pub use state::{SchedulingState, SchedulingStatus};
