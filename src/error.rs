//! Error types for the Tableflow system.
//!
//! All construction-time failures (malformed configuration, duplicate derived
//! identifiers, unparseable schedules) are surfaced here so that an invalid
//! workflow graph is never handed to the orchestrator. Run-time task failures
//! belong to the orchestrator and have no representation in this crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableflowError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Registration error: {0}")]
    RegistrationError(String),
    #[error("Schedule error: {0}")]
    ScheduleError(String),
    #[error("Template error: {0}")]
    TemplateError(String),
    #[error("Duplicate task identifier '{task_id}' derived from process '{process_name}'")]
    DuplicateTaskId {
        task_id: String,
        process_name: String,
    },
    #[error("Duplicate workflow identifier '{0}' already registered")]
    DuplicateWorkflowId(String),
    #[error("Missing required field '{field}' in {context}")]
    MissingRequiredField { field: String, context: String },
}

impl From<serde_yaml::Error> for TableflowError {
    fn from(error: serde_yaml::Error) -> Self {
        TableflowError::ConfigurationError(format!("Invalid YAML: {error}"))
    }
}

impl From<serde_json::Error> for TableflowError {
    fn from(error: serde_json::Error) -> Self {
        TableflowError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

pub type Result<T> = anyhow::Result<T, TableflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_task_id_display() {
        let err = TableflowError::DuplicateTaskId {
            task_id: "gsync_x".to_string(),
            process_name: "x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate task identifier 'gsync_x' derived from process 'x'"
        );
    }

    #[test]
    fn test_missing_field_display() {
        let err = TableflowError::MissingRequiredField {
            field: "process_name".to_string(),
            context: "table entry 'table1'".to_string(),
        };
        assert!(err.to_string().contains("process_name"));
        assert!(err.to_string().contains("table1"));
    }
}
