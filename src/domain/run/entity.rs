//! Run lifecycle entities

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::RunError;
use crate::domain::decision::DecisionSummary;

/// Regex pattern for valid run IDs: run-{uuid}
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^run-[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$").unwrap()
});

/// Maximum length for run IDs
pub const MAX_ID_LENGTH: usize = 40; // "run-" + 36 char UUID

/// Validated run identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Create a new validated run ID
    pub fn new(id: impl Into<String>) -> Result<Self, RunError> {
        let id = id.into();
        validate_run_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh run ID
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        Self(format!("run-{}", uuid))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RunId {
    type Error = RunError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a run ID string
pub fn validate_run_id(id: &str) -> Result<(), RunError> {
    if id.is_empty() {
        return Err(RunError::invalid_id("Run ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(RunError::invalid_id(format!(
            "Run ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(RunError::invalid_id(format!(
            "Invalid run ID '{}': must be in format run-{{uuid}}",
            id
        )));
    }

    Ok(())
}

/// Status of an asynchronous run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is created but execution has not started
    #[default]
    Queued,

    /// The workflow is executing
    Running,

    /// The workflow finished and a result is attached
    Completed,

    /// The workflow failed and an error is attached
    Failed,
}

impl RunStatus {
    /// Check if this status represents a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this status can transition to another status
    pub fn can_transition_to(&self, target: RunStatus) -> bool {
        match (self, target) {
            (Self::Queued, Self::Running) => true,
            (Self::Running, Self::Completed) => true,
            (Self::Running, Self::Failed) => true,

            // Terminal states never transition; a poller may observe
            // queued → running → terminal, never the reverse.
            _ => false,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(RunError::invalid_id(format!("Unknown run status '{}'", other))),
        }
    }
}

/// The persisted lifecycle record for one workflow execution.
///
/// Mutated only through the mark_* methods; `result` is present exactly when
/// the run completed, `error` exactly when it failed, and `completed_at` is
/// set once on the transition into a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    /// Unique run identifier, immutable after creation
    id: RunId,

    /// The decision query this run is answering
    query: String,

    /// Current lifecycle status
    status: RunStatus,

    /// Flattened decision summary (present iff completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<DecisionSummary>,

    /// Failure cause (present iff failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    /// When the run was created
    created_at: DateTime<Utc>,

    /// When the run reached a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    /// Create a new queued run for a query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: RunId::generate(),
            query: query.into(),
            status: RunStatus::Queued,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Reconstruct a record from stored fields (repository use)
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: RunId,
        query: String,
        status: RunStatus,
        result: Option<DecisionSummary>,
        error: Option<String>,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            query,
            status,
            result,
            error,
            created_at,
            completed_at,
        }
    }

    // Getters

    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn result(&self) -> Option<&DecisionSummary> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark the run as running
    pub fn mark_running(&mut self) -> Result<(), RunError> {
        if !self.status.can_transition_to(RunStatus::Running) {
            return Err(RunError::invalid_transition(
                self.status.to_string(),
                "running",
                "Run is not queued",
            ));
        }
        self.status = RunStatus::Running;
        Ok(())
    }

    /// Mark the run as completed with its summary
    pub fn mark_completed(&mut self, result: DecisionSummary) -> Result<(), RunError> {
        if !self.status.can_transition_to(RunStatus::Completed) {
            return Err(RunError::invalid_transition(
                self.status.to_string(),
                "completed",
                "Run is not running",
            ));
        }
        self.status = RunStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the run as failed with its cause
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), RunError> {
        if !self.status.can_transition_to(RunStatus::Failed) {
            return Err(RunError::invalid_transition(
                self.status.to_string(),
                "failed",
                "Run is not running",
            ));
        }
        self.status = RunStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> DecisionSummary {
        DecisionSummary {
            selected_decision: "Adopt it".to_string(),
            selected_decision_comment: "Best upside".to_string(),
            alternative_decision: "Pilot first".to_string(),
            alternative_decision_comment: "Safer".to_string(),
            trigger: "t".to_string(),
            root_cause: "r".to_string(),
            scope: "s".to_string(),
            draft: "d".to_string(),
            goals: "g".to_string(),
            information_needs: "none".to_string(),
            retrieved_info: None,
            updated_draft: None,
            alternatives: "a, b".to_string(),
        }
    }

    #[test]
    fn test_run_id_generate() {
        let id = RunId::generate();
        assert!(id.as_str().starts_with("run-"));
        assert_eq!(id.as_str().len(), 40);
    }

    #[test]
    fn test_run_id_valid() {
        assert!(RunId::new("run-12345678-1234-1234-1234-123456789abc").is_ok());
    }

    #[test]
    fn test_run_id_invalid() {
        assert!(RunId::new("").is_err());
        assert!(RunId::new("invalid").is_err());
        assert!(RunId::new("run-invalid").is_err());
        assert!(RunId::new("12345678-1234-1234-1234-123456789abc").is_err());
    }

    #[test]
    fn test_run_id_serialization() {
        let id = RunId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.starts_with("\"run-"));

        let deserialized: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_fresh_ids_are_distinct() {
        assert_ne!(RunId::generate(), RunId::generate());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_transitions() {
        assert!(RunStatus::Queued.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Queued.can_transition_to(RunStatus::Completed));

        assert!(RunStatus::Running.can_transition_to(RunStatus::Completed));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Failed));

        assert!(!RunStatus::Completed.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Failed.can_transition_to(RunStatus::Running));
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            RunStatus::Queued,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            let parsed: RunStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_record_creation() {
        let record = RunRecord::new("Should I adopt a four-day work week?");

        assert!(record.id().as_str().starts_with("run-"));
        assert_eq!(record.status(), RunStatus::Queued);
        assert_eq!(record.query(), "Should I adopt a four-day work week?");
        assert!(record.result().is_none());
        assert!(record.error().is_none());
        assert!(record.completed_at().is_none());
    }

    #[test]
    fn test_record_lifecycle() {
        let mut record = RunRecord::new("query");

        assert!(record.mark_running().is_ok());
        assert_eq!(record.status(), RunStatus::Running);
        assert!(record.completed_at().is_none());

        assert!(record.mark_completed(summary()).is_ok());
        assert_eq!(record.status(), RunStatus::Completed);
        assert!(record.completed_at().is_some());
        assert!(record.result().is_some());
        assert!(record.error().is_none());
    }

    #[test]
    fn test_record_failure() {
        let mut record = RunRecord::new("query");
        record.mark_running().unwrap();

        assert!(record.mark_failed("stage blew up").is_ok());
        assert_eq!(record.status(), RunStatus::Failed);
        assert_eq!(record.error(), Some("stage blew up"));
        assert!(record.result().is_none());
        assert!(record.completed_at().is_some());
    }

    #[test]
    fn test_exactly_one_of_result_and_error_on_terminal() {
        let mut completed = RunRecord::new("q");
        completed.mark_running().unwrap();
        completed.mark_completed(summary()).unwrap();
        assert!(completed.result().is_some() && completed.error().is_none());

        let mut failed = RunRecord::new("q");
        failed.mark_running().unwrap();
        failed.mark_failed("boom").unwrap();
        assert!(failed.result().is_none() && failed.error().is_some());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut record = RunRecord::new("query");

        // Cannot reach a terminal state from queued
        assert!(record.mark_completed(summary()).is_err());
        assert!(record.mark_failed("err").is_err());

        record.mark_running().unwrap();
        record.mark_completed(summary()).unwrap();

        // Terminal states never transition
        assert!(record.mark_running().is_err());
        assert!(record.mark_failed("err").is_err());
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let mut record = RunRecord::new("query");
        record.mark_running().unwrap();
        record.mark_completed(summary()).unwrap();

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"completed\""));

        let deserialized: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, record);
    }
}
