//! Decision Engine API
//!
//! A multi-stage decision workflow over an external reasoning service:
//! - Fixed sequence of stages, each gated by an evaluator that can demand retries
//! - Asynchronous runs tracked through a queued → running → terminal lifecycle
//! - Run records persisted behind a storage-agnostic repository (in-memory or Redis)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::warn;

use api::AppState;
use config::StorageBackend;
use domain::decision::{DecisionEngine, EngineConfig};
use domain::reasoning::ReasoningClient;
use infrastructure::reasoning::{OpenAiClientConfig, OpenAiReasoningClient};
use infrastructure::run::{RunStoreConfig, StorageKind, create_run_repository};
use infrastructure::services::RunManager;

/// Assemble the application state from configuration.
///
/// The storage backend is resolved here, exactly once; an unreachable
/// durable store degrades to the volatile one with a logged warning.
pub async fn build_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store_config = run_store_config(config);
    let repository = create_run_repository(&store_config).await;

    let api_key = config.reasoning.api_key.clone().unwrap_or_else(|| {
        warn!("No reasoning API key configured; reasoning calls will be rejected upstream");
        String::new()
    });

    let stage_client: Arc<dyn ReasoningClient> = Arc::new(OpenAiReasoningClient::new(
        OpenAiClientConfig::new(api_key.clone(), config.reasoning.model.clone())
            .with_base_url(config.reasoning.base_url.clone())
            .with_timeout(config.reasoning.timeout()),
    )?);

    let evaluator_client: Arc<dyn ReasoningClient> = Arc::new(OpenAiReasoningClient::new(
        OpenAiClientConfig::new(api_key, config.reasoning.evaluator_model().to_string())
            .with_base_url(config.reasoning.base_url.clone())
            .with_timeout(config.reasoning.timeout()),
    )?);

    let engine = DecisionEngine::with_clients(stage_client, evaluator_client).with_config(
        EngineConfig {
            max_stage_attempts: config.engine.max_stage_attempts,
        },
    );

    let manager = RunManager::new(repository, Arc::new(engine));

    Ok(AppState::new(Arc::new(manager)))
}

fn run_store_config(config: &AppConfig) -> RunStoreConfig {
    let kind = match config.storage.backend {
        StorageBackend::Volatile => StorageKind::Volatile,
        StorageBackend::Durable => StorageKind::Durable {
            url: config.storage.redis_url.clone(),
        },
    };

    RunStoreConfig {
        kind,
        key_prefix: config.storage.key_prefix.clone(),
        terminal_ttl: config.storage.terminal_ttl(),
        ..RunStoreConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_app_state_with_defaults() {
        let config = AppConfig::default();
        let state = build_app_state(&config).await.unwrap();

        // Volatile backend: the state is immediately usable
        let record = state.run_manager.create("wire everything up").await.unwrap();
        assert!(state.run_manager.get(record.id()).await.unwrap().is_some());
    }

    #[test]
    fn test_run_store_config_mapping() {
        let mut config = AppConfig::default();
        assert_eq!(run_store_config(&config).kind, StorageKind::Volatile);

        config.storage.backend = StorageBackend::Durable;
        config.storage.redis_url = "redis://cache:6379".to_string();
        assert_eq!(
            run_store_config(&config).kind,
            StorageKind::Durable {
                url: "redis://cache:6379".to_string()
            }
        );
    }
}
