//! Application services

pub mod run_manager;

pub use run_manager::{RunManager, RunManagerConfig, RunManagerTrait};
