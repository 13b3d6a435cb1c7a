//! Decision workflow domain
//!
//! The workflow state machine: a fixed ordered sequence of stages, each
//! gated by an evaluator that may send the stage back for another attempt,
//! accumulating into a [`DecisionState`] and ending with a structured
//! selection of the best option and its runner-up.

pub mod engine;
pub mod error;
pub mod evaluation;
pub mod stage;
pub mod state;

pub use engine::{DecisionEngine, EngineConfig};
pub use error::DecisionError;
pub use evaluation::{EVALUATOR_SYSTEM_PROMPT, EvaluationOutcome, Verdict};
pub use stage::{ANALYSIS_STAGES, RETRIEVAL_STAGES, Stage};
pub use state::{DecisionState, DecisionSummary, Selection};
