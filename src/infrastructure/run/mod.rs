//! Run store implementations

pub mod factory;
pub mod in_memory_repository;
pub mod redis_repository;

pub use factory::{RunStoreConfig, StorageKind, create_durable_repository, create_run_repository};
pub use in_memory_repository::InMemoryRunRepository;
pub use redis_repository::{RedisRunRepository, RedisRunStoreConfig};
