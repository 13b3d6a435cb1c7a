//! Reasoning service contract
//!
//! The decision stages and their evaluators are powered by an external
//! reasoning service. The domain only depends on the [`ReasoningClient`]
//! trait; the HTTP implementation lives in the infrastructure layer.

pub mod client;
pub mod error;

pub use client::ReasoningClient;
pub use error::ReasoningError;
