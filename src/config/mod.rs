//! Application configuration

pub mod app_config;

pub use app_config::{
    AppConfig, EngineSettings, LogFormat, LoggingConfig, ReasoningConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
