//! Run lifecycle error types

use thiserror::Error;

/// Errors raised by run identity validation and status transitions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RunError {
    #[error("Invalid run ID: {0}")]
    InvalidId(String),

    #[error("Invalid status transition from '{from}' to '{to}': {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },
}

impl RunError {
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId(message.into())
    }

    pub fn invalid_transition(
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RunError::invalid_id("must be in format run-{uuid}");
        assert_eq!(err.to_string(), "Invalid run ID: must be in format run-{uuid}");

        let err = RunError::invalid_transition("completed", "running", "terminal state");
        assert_eq!(
            err.to_string(),
            "Invalid status transition from 'completed' to 'running': terminal state"
        );
    }
}
