//! Decision workflow error types

use thiserror::Error;

/// Errors that terminate a decision run
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecisionError {
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: &'static str, message: String },

    #[error("Stage '{stage}' did not converge after {attempts} attempts")]
    DidNotConverge { stage: &'static str, attempts: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DecisionError {
    pub fn stage_failed(stage: &'static str, message: impl Into<String>) -> Self {
        Self::StageFailed {
            stage,
            message: message.into(),
        }
    }

    pub fn did_not_converge(stage: &'static str, attempts: u32) -> Self {
        Self::DidNotConverge { stage, attempts }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
