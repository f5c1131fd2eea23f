//! Scheduling run state.

use serde::{Deserialize, Serialize};

/// Final verdict of a scheduling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingStatus {
    #[default]
    Pending,
    ValidationPassed,
    ValidationFailed,
}

impl SchedulingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingStatus::Pending => "pending",
            SchedulingStatus::ValidationPassed => "validation_passed",
            SchedulingStatus::ValidationFailed => "validation_failed",
        }
    }
}

impl std::fmt::Display for SchedulingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a scheduling run produces, filled stage by stage.
///
/// Starts empty; each stage only writes its own fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    pub customer_inquiry: String,
    pub scheduling_rules: Vec<String>,
    pub python_validation_method: String,
    pub python_parameters_extraction_method: String,
    pub validation_errors: Vec<String>,
    pub validation_passed: bool,
    pub status: SchedulingStatus,
}

impl SchedulingState {
    pub fn new(customer_inquiry: impl Into<String>) -> Self {
        Self {
            customer_inquiry: customer_inquiry.into(),
            ..Self::default()
        }
    }

    /// Record the validation result.
    pub fn record_validation(&mut self, errors: Vec<String>) {
        self.validation_passed = errors.is_empty();
        self.validation_errors = errors;
    }

    /// Terminal stage: derive the status from `validation_passed`.
    pub fn finish(&mut self) -> SchedulingStatus {
        self.status = if self.validation_passed {
            SchedulingStatus::ValidationPassed
        } else {
            SchedulingStatus::ValidationFailed
        };
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_pending() {
        let state = SchedulingState::new("Tuesday at 2pm");
        assert_eq!(state.status, SchedulingStatus::Pending);
        assert!(!state.validation_passed);
        assert!(state.scheduling_rules.is_empty());
    }

    #[test]
    fn test_finish_follows_validation() {
        let mut state = SchedulingState::new("x");
        state.record_validation(vec![]);
        assert_eq!(state.finish(), SchedulingStatus::ValidationPassed);

        state.record_validation(vec!["No appointments on Sundays.".to_string()]);
        assert_eq!(state.finish(), SchedulingStatus::ValidationFailed);
        assert_eq!(state.validation_errors.len(), 1);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(SchedulingState::new("hi")).unwrap();
        assert_eq!(json["customerInquiry"], "hi");
        assert_eq!(json["status"], "pending");
        assert!(json.get("pythonParametersExtractionMethod").is_some());
    }
}
