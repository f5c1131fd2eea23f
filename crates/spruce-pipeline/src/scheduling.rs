//! Scheduling validation workflow.
//!
//! ```text
//!            ┌─ extract rules ─► generate validator ─┐
//!  inquiry ──┤                                        ├─► execute ─► status
//!            └─ generate parameter extractor ────────┘
//! ```
//!
//! The two branches run concurrently and are joined before execution. The
//! first failure aborts the run and drops the other branch.

use serde::Serialize;
use spruce_store::SharedStore;
use tracing::Instrument;
use uuid::Uuid;

use crate::codegen::CodeGenerator;
use crate::error::{Result, WorkflowError};
use crate::executor::ValidationRunner;
use crate::rules::extract_rules;
use crate::state::{SchedulingState, SchedulingStatus};

/// Collaborators of a scheduling run, injected by the caller.
#[derive(Clone)]
pub struct WorkflowContext {
    pub store: SharedStore,
    pub generator: CodeGenerator,
    pub runner: ValidationRunner,
    /// Collection holding the scheduling-rule documents.
    pub collection: String,
}

impl WorkflowContext {
    pub fn new(
        store: SharedStore,
        generator: CodeGenerator,
        runner: ValidationRunner,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            generator,
            runner,
            collection: collection.into(),
        }
    }
}

/// Result of a scheduling run.
///
/// Serializes as `{"status": ..., "validationErrors": [...]}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutcome {
    pub run_id: Uuid,
    pub status: SchedulingStatus,
    pub validation_errors: Vec<String>,
    #[serde(skip)]
    pub state: SchedulingState,
}

impl SchedulingOutcome {
    pub fn passed(&self) -> bool {
        self.status == SchedulingStatus::ValidationPassed
    }
}

/// Validates a customer's booking request against the stored rules.
pub struct SchedulingWorkflow {
    context: WorkflowContext,
}

impl SchedulingWorkflow {
    pub fn new(context: WorkflowContext) -> Self {
        Self { context }
    }

    /// Run the workflow for one inquiry.
    pub async fn run(&self, inquiry: &str) -> Result<SchedulingOutcome> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("scheduling", %run_id);
        self.run_stages(run_id, inquiry).instrument(span).await
    }

    async fn run_stages(&self, run_id: Uuid, inquiry: &str) -> Result<SchedulingOutcome> {
        let ctx = &self.context;
        let mut state = SchedulingState::new(inquiry);
        tracing::info!(inquiry, "Scheduling run started");

        let rules_branch = async {
            tracing::info!("Rule extraction: start");
            let rules = extract_rules(ctx.store.as_ref(), &ctx.collection).await?;
            if rules.is_empty() {
                tracing::warn!(collection = %ctx.collection, "No scheduling rules found");
            }
            tracing::info!("Validator generation: start");
            let validator = ctx.generator.generate_validator(&rules).await?;
            tracing::info!(bytes = validator.len(), "Validator generation: end");
            Ok::<_, WorkflowError>((rules, validator))
        };

        let inquiry_branch = async {
            tracing::info!("Parameter extractor generation: start");
            let extractor = ctx.generator.generate_parameter_extractor(inquiry).await?;
            tracing::info!(bytes = extractor.len(), "Parameter extractor generation: end");
            Ok::<_, WorkflowError>(extractor)
        };

        let ((rules, validator), extractor) = tokio::try_join!(rules_branch, inquiry_branch)?;
        state.scheduling_rules = rules;
        state.python_validation_method = validator;
        state.python_parameters_extraction_method = extractor;

        tracing::info!("Validation: start");
        let errors = ctx
            .runner
            .run(
                &state.python_validation_method,
                &state.python_parameters_extraction_method,
            )
            .await?;
        state.record_validation(errors);
        tracing::info!(
            passed = state.validation_passed,
            errors = state.validation_errors.len(),
            "Validation: end"
        );

        let status = state.finish();
        tracing::info!(%status, "Scheduling run finished");

        Ok(SchedulingOutcome {
            run_id,
            status,
            validation_errors: state.validation_errors.clone(),
            state,
        })
    }
}
