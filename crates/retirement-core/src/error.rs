use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Computation failure: {0}")]
    ComputationFailure(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PlannerError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PlannerError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the error was caused by caller-supplied data rather than
    /// by the computation itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PlannerError::MissingField { .. } | PlannerError::InvalidInput { .. }
        )
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::SerializationError(e.to_string())
    }
}
