//! Engine errors
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The operation is not allowed in the engine's current state. Nothing
    /// was mutated.
    #[error("TRANSITION/{operation}: not allowed while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },

    #[error("PROFILE/{0}")]
    InvalidProfile(String),
}

impl EngineError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, EngineError::InvalidTransition { .. })
    }
}
