//! Run manager: the process lifecycle around the decision workflow
//!
//! Creates run records, schedules background execution, and keeps the
//! record moving queued → running → completed/failed through the run store.
//! The one property everything here protects: a run never ends in an
//! unrecorded state, whatever the failure mode.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::decision::{DecisionEngine, DecisionError, DecisionSummary};
use crate::domain::error::DomainError;
use crate::domain::run::{RunId, RunRecord, RunRepository};

/// Run manager configuration
#[derive(Debug, Clone)]
pub struct RunManagerConfig {
    /// Attempts for a single record save before giving up
    pub save_retry_attempts: u32,

    /// Delay between save attempts
    pub save_retry_delay: Duration,
}

impl Default for RunManagerConfig {
    fn default() -> Self {
        Self {
            save_retry_attempts: 3,
            save_retry_delay: Duration::from_millis(100),
        }
    }
}

/// Trait for the run manager (for dynamic dispatch in AppState)
#[async_trait]
pub trait RunManagerTrait: Send + Sync + Debug {
    /// Create a queued run for a query; the id is returned before any stage executes
    async fn create(&self, query: &str) -> Result<RunRecord, DomainError>;

    /// Begin executing a run in the background without blocking the caller
    fn schedule(&self, id: RunId);

    /// Execute a run to its terminal state on the current task
    async fn execute(&self, id: &RunId) -> Result<RunRecord, DomainError>;

    /// Run the workflow synchronously, without a run record
    async fn run_sync(&self, query: &str) -> Result<DecisionSummary, DomainError>;

    /// Get a run record by id
    async fn get(&self, id: &RunId) -> Result<Option<RunRecord>, DomainError>;

    /// List all known run records
    async fn list(&self) -> Result<Vec<RunRecord>, DomainError>;

    /// Delete terminal records whose completion is older than the given age.
    ///
    /// Queued and running records are never deleted, regardless of age.
    async fn cleanup(&self, older_than: Duration) -> Result<u64, DomainError>;
}

/// Run manager implementation
#[derive(Debug)]
pub struct RunManager {
    repository: Arc<dyn RunRepository>,
    engine: Arc<DecisionEngine>,
    config: RunManagerConfig,
}

impl RunManager {
    /// Create a new run manager over a run store and a decision engine
    pub fn new(repository: Arc<dyn RunRepository>, engine: Arc<DecisionEngine>) -> Self {
        Self {
            repository,
            engine,
            config: RunManagerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(
        repository: Arc<dyn RunRepository>,
        engine: Arc<DecisionEngine>,
        config: RunManagerConfig,
    ) -> Self {
        Self {
            repository,
            engine,
            config,
        }
    }

    fn validate_query(query: &str) -> Result<&str, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::validation("Decision query cannot be empty"));
        }
        Ok(query)
    }
}

#[async_trait]
impl RunManagerTrait for RunManager {
    #[instrument(skip(self, query))]
    async fn create(&self, query: &str) -> Result<RunRecord, DomainError> {
        let query = Self::validate_query(query)?;

        let record = RunRecord::new(query);
        self.repository.save(&record).await?;

        info!(run_id = %record.id(), "Created queued run");
        Ok(record)
    }

    fn schedule(&self, id: RunId) {
        let repository = Arc::clone(&self.repository);
        let engine = Arc::clone(&self.engine);
        let config = self.config.clone();

        info!(run_id = %id, "Scheduling background run");
        tokio::spawn(async move {
            if let Err(e) = execute_run(repository, engine, config, &id).await {
                error!(run_id = %id, error = %e, "Background run left in a non-terminal state");
            }
        });
    }

    #[instrument(skip(self))]
    async fn execute(&self, id: &RunId) -> Result<RunRecord, DomainError> {
        execute_run(
            Arc::clone(&self.repository),
            Arc::clone(&self.engine),
            self.config.clone(),
            id,
        )
        .await
    }

    #[instrument(skip(self, query))]
    async fn run_sync(&self, query: &str) -> Result<DecisionSummary, DomainError> {
        let query = Self::validate_query(query)?;

        let state = self.engine.run(query).await.map_err(map_decision_error)?;
        Ok(state.into_summary())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &RunId) -> Result<Option<RunRecord>, DomainError> {
        self.repository.get(id).await
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<RunRecord>, DomainError> {
        self.repository.list_all().await
    }

    #[instrument(skip(self))]
    async fn cleanup(&self, older_than: Duration) -> Result<u64, DomainError> {
        let age = chrono::Duration::from_std(older_than)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        let cutoff = Utc::now() - age;

        let ids = self.repository.list_completed_before(cutoff).await?;

        let mut deleted = 0u64;
        for id in ids {
            if self.repository.delete(&id).await? {
                deleted += 1;
            }
        }

        if deleted > 0 {
            info!(deleted_count = deleted, "Cleaned up old runs");
        }

        Ok(deleted)
    }
}

/// Drive one run to a terminal state.
///
/// Free function so `schedule` can move owned handles into the spawned
/// task. Every engine failure, expected or not, ends in a persisted failed
/// record; only a storage outage that survives the bounded save retries can
/// leave the record behind, and that is logged and propagated.
async fn execute_run(
    repository: Arc<dyn RunRepository>,
    engine: Arc<DecisionEngine>,
    config: RunManagerConfig,
    id: &RunId,
) -> Result<RunRecord, DomainError> {
    let Some(mut record) = repository.get(id).await? else {
        warn!(run_id = %id, "Run disappeared before execution");
        return Err(DomainError::not_found(format!("Run '{}'", id)));
    };

    let query = record.query().to_string();

    record
        .mark_running()
        .map_err(|e| DomainError::validation(e.to_string()))?;
    save_with_retry(repository.as_ref(), &record, &config).await?;
    debug!(run_id = %id, "Run is executing");

    match engine.run(&query).await {
        Ok(state) => {
            record
                .mark_completed(state.into_summary())
                .map_err(|e| DomainError::internal(e.to_string()))?;
            info!(run_id = %id, "Run completed");
        }
        Err(e) => {
            record
                .mark_failed(e.to_string())
                .map_err(|e| DomainError::internal(e.to_string()))?;
            warn!(run_id = %id, error = %e, "Run failed");
        }
    }

    save_with_retry(repository.as_ref(), &record, &config).await?;
    Ok(record)
}

/// Save a record, retrying a bounded number of times on storage errors
async fn save_with_retry(
    repository: &dyn RunRepository,
    record: &RunRecord,
    config: &RunManagerConfig,
) -> Result<(), DomainError> {
    let mut last_error = None;

    for attempt in 1..=config.save_retry_attempts.max(1) {
        match repository.save(record).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    run_id = %record.id(),
                    attempt,
                    error = %e,
                    "Failed to persist run record"
                );
                last_error = Some(e);

                if attempt < config.save_retry_attempts {
                    tokio::time::sleep(config.save_retry_delay).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| DomainError::storage("Run record save failed with no attempts made")))
}

fn map_decision_error(error: DecisionError) -> DomainError {
    match error {
        DecisionError::InvalidInput(message) => DomainError::validation(message),
        other => DomainError::reasoning(other.to_string()),
    }
}
