//! Run store factory: one startup-time decision between the two backends

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::DomainError;
use crate::domain::run::RunRepository;

use super::in_memory_repository::InMemoryRunRepository;
use super::redis_repository::{RedisRunRepository, RedisRunStoreConfig};

/// Which run store backs the lifecycle manager.
///
/// Resolved exactly once at startup; there is no per-call probing.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageKind {
    /// Process-local map; nothing survives a restart
    Volatile,
    /// Redis-backed store shared across instances
    Durable { url: String },
}

impl Default for StorageKind {
    fn default() -> Self {
        Self::Volatile
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::Volatile => write!(f, "volatile"),
            StorageKind::Durable { url } => write!(f, "durable ({})", url),
        }
    }
}

/// Configuration for the run store factory
#[derive(Debug, Clone)]
pub struct RunStoreConfig {
    /// Which backend to use
    pub kind: StorageKind,
    /// Key prefix for the durable backend
    pub key_prefix: String,
    /// TTL for terminal records in the durable backend
    pub terminal_ttl: Duration,
    /// Connection timeout for the durable backend
    pub connection_timeout: Duration,
}

impl Default for RunStoreConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Volatile,
            key_prefix: "run".to_string(),
            terminal_ttl: Duration::from_secs(24 * 3600),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RunStoreConfig {
    /// Volatile store configuration
    pub fn volatile() -> Self {
        Self::default()
    }

    /// Durable store configuration for the given Redis URL
    pub fn durable(url: impl Into<String>) -> Self {
        Self {
            kind: StorageKind::Durable { url: url.into() },
            ..Self::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the terminal-record TTL
    pub fn with_terminal_ttl(mut self, ttl: Duration) -> Self {
        self.terminal_ttl = ttl;
        self
    }
}

/// Create the run store for the configured backend.
///
/// An unreachable durable store does not prevent startup: the factory logs
/// the degradation and falls back to the volatile implementation. Runs will
/// then not survive restarts nor be shared across instances.
pub async fn create_run_repository(config: &RunStoreConfig) -> Arc<dyn RunRepository> {
    match &config.kind {
        StorageKind::Volatile => {
            info!("Using volatile in-memory run store");
            Arc::new(InMemoryRunRepository::new())
        }
        StorageKind::Durable { url } => {
            let redis_config = RedisRunStoreConfig::new(url.clone())
                .with_key_prefix(config.key_prefix.clone())
                .with_terminal_ttl(config.terminal_ttl)
                .with_connection_timeout(config.connection_timeout);

            match RedisRunRepository::new(redis_config).await {
                Ok(repo) => {
                    info!(url = %url, "Using durable Redis run store");
                    Arc::new(repo)
                }
                Err(e) => {
                    warn!(
                        url = %url,
                        error = %e,
                        "Durable run store unreachable, falling back to volatile storage"
                    );
                    Arc::new(InMemoryRunRepository::new())
                }
            }
        }
    }
}

/// Create a durable store without the fallback, for callers that must fail
/// loudly when Redis is down.
pub async fn create_durable_repository(
    config: &RunStoreConfig,
) -> Result<Arc<dyn RunRepository>, DomainError> {
    match &config.kind {
        StorageKind::Volatile => Ok(Arc::new(InMemoryRunRepository::new())),
        StorageKind::Durable { url } => {
            let redis_config = RedisRunStoreConfig::new(url.clone())
                .with_key_prefix(config.key_prefix.clone())
                .with_terminal_ttl(config.terminal_ttl)
                .with_connection_timeout(config.connection_timeout);

            let repo = RedisRunRepository::new(redis_config).await?;
            Ok(Arc::new(repo))
        }
    }
}

impl std::str::FromStr for StorageKind {
    type Err = DomainError;

    /// Parse a bare kind name; the durable variant gets its URL from the
    /// storage configuration section.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "volatile" | "memory" | "in_memory" => Ok(StorageKind::Volatile),
            "durable" | "redis" => Ok(StorageKind::Durable { url: String::new() }),
            _ => Err(DomainError::configuration(format!(
                "Unknown storage kind: {}. Valid kinds: volatile, durable",
                s
            ))),
        }
    }
}
