//! Domain layer - Core business logic and entities

pub mod decision;
pub mod error;
pub mod reasoning;
pub mod run;

pub use decision::{
    DecisionEngine, DecisionError, DecisionState, DecisionSummary, EngineConfig,
    EvaluationOutcome, Selection, Stage, Verdict,
};
pub use error::DomainError;
pub use reasoning::{ReasoningClient, ReasoningError};
pub use run::{RunError, RunId, RunRecord, RunRepository, RunStatus, validate_run_id};
