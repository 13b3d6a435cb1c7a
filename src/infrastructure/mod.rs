//! Infrastructure layer - External service implementations

pub mod observability;
pub mod reasoning;
pub mod run;
pub mod services;

pub use reasoning::{OpenAiClientConfig, OpenAiReasoningClient};
pub use run::{
    InMemoryRunRepository, RedisRunRepository, RedisRunStoreConfig, RunStoreConfig, StorageKind,
    create_run_repository,
};
pub use services::{RunManager, RunManagerConfig, RunManagerTrait};
