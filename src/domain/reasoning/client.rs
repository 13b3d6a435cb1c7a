use std::fmt::Debug;

use async_trait::async_trait;

use super::ReasoningError;

/// Trait for the external reasoning service (an LLM behind an HTTP API).
///
/// A single call covers one stage or evaluator invocation; latency is
/// unbounded from the caller's perspective.
#[async_trait]
pub trait ReasoningClient: Send + Sync + Debug {
    /// Send a prompt and return the raw text answer
    async fn invoke(&self, system_prompt: &str, prompt: &str) -> Result<String, ReasoningError>;

    /// Name of the model answering the calls
    fn model_name(&self) -> &str;
}
