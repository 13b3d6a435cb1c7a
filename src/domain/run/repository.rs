//! Run repository trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{RunId, RunRecord};
use crate::domain::error::DomainError;

/// Storage contract for run records.
///
/// Every operation is independently atomic; no cross-operation transactions
/// are required. Implementations must be safe under concurrent access from
/// the scheduling path and request handlers, and the durable implementation
/// must not assume it is the sole writer of the backing store.
#[async_trait]
pub trait RunRepository: Send + Sync + Debug {
    /// Upsert a record by id, maintaining the id index and, for terminal
    /// records, the completion-time index and expiry policy.
    async fn save(&self, record: &RunRecord) -> Result<(), DomainError>;

    /// Get a record by ID
    async fn get(&self, id: &RunId) -> Result<Option<RunRecord>, DomainError>;

    /// Check whether a record exists
    async fn exists(&self, id: &RunId) -> Result<bool, DomainError>;

    /// List all known records
    async fn list_all(&self) -> Result<Vec<RunRecord>, DomainError>;

    /// IDs of terminal records whose completion time is before the cutoff
    async fn list_completed_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<RunId>, DomainError>;

    /// Remove a record and both its index entries, returns true if deleted
    async fn delete(&self, id: &RunId) -> Result<bool, DomainError>;
}
