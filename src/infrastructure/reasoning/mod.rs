//! Reasoning service implementations

pub mod openai;

pub use openai::{OpenAiClientConfig, OpenAiReasoningClient};
