//! Reasoning service error taxonomy

use thiserror::Error;

/// Errors from the external reasoning service.
///
/// The kinds are deliberately distinguishable: transport and quota failures
/// abort a run, while a malformed response is recoverable by re-asking.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReasoningError {
    #[error("Transport error calling reasoning service: {0}")]
    Transport(String),

    #[error("Reasoning service rate limited: {0}")]
    RateLimited(String),

    #[error("Reasoning service returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed reasoning output: {0}")]
    Malformed(String),
}

impl ReasoningError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Whether the stage loop may recover by re-invoking the stage.
    ///
    /// Only a malformed response qualifies; transport, rate-limit, and API
    /// failures abort the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReasoningError::transport("connection refused");
        assert_eq!(
            err.to_string(),
            "Transport error calling reasoning service: connection refused"
        );

        let err = ReasoningError::api(500, "internal error");
        assert_eq!(
            err.to_string(),
            "Reasoning service returned status 500: internal error"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(ReasoningError::malformed("empty body").is_recoverable());
        assert!(!ReasoningError::transport("timeout").is_recoverable());
        assert!(!ReasoningError::rate_limited("429").is_recoverable());
        assert!(!ReasoningError::api(503, "unavailable").is_recoverable());
    }
}
