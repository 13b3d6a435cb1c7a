//! Redis run repository implementation
//!
//! The durable store: run records survive restarts and are shared across
//! service instances pointed at the same Redis. Layout per run:
//!
//! - `{prefix}:{id}` - hash with the scalar fields
//! - `{prefix}:{id}:result` - serialized summary blob (completed runs only)
//! - `{prefix}:all` - set of every known run id
//! - `{prefix}:completed` - sorted set id -> completion timestamp
//!
//! A single `save` writes all of these in one MULTI/EXEC pipeline so a
//! concurrent reader never observes a half-written record. Terminal records
//! carry a TTL on the hash and the blob, so storage is self-bounding even if
//! cleanup never runs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::decision::DecisionSummary;
use crate::domain::error::DomainError;
use crate::domain::run::{RunId, RunRecord, RunRepository, RunStatus};

/// Configuration for the Redis run store
#[derive(Debug, Clone)]
pub struct RedisRunStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: String,
    /// TTL applied to terminal records
    pub terminal_ttl: Duration,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisRunStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "run".to_string(),
            terminal_ttl: Duration::from_secs(24 * 3600),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisRunStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the TTL for terminal records
    pub fn with_terminal_ttl(mut self, ttl: Duration) -> Self {
        self.terminal_ttl = ttl;
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis implementation of RunRepository
#[derive(Clone)]
pub struct RedisRunRepository {
    connection: ConnectionManager,
    config: RedisRunStoreConfig,
}

impl fmt::Debug for RedisRunRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRunRepository")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisRunRepository {
    /// Connect to Redis; fails when the store is unreachable within the
    /// configured timeout.
    pub async fn new(config: RedisRunStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::storage(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                DomainError::storage(format!(
                    "Timed out connecting to Redis at {}",
                    config.url
                ))
            })?
            .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    /// Connect with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisRunStoreConfig::new(url)).await
    }

    fn record_key(&self, id: &RunId) -> String {
        format!("{}:{}", self.config.key_prefix, id.as_str())
    }

    fn result_key(&self, id: &RunId) -> String {
        format!("{}:{}:result", self.config.key_prefix, id.as_str())
    }

    fn all_key(&self) -> String {
        format!("{}:all", self.config.key_prefix)
    }

    fn completed_key(&self) -> String {
        format!("{}:completed", self.config.key_prefix)
    }

    fn parse_record(
        &self,
        id: &RunId,
        fields: std::collections::HashMap<String, String>,
        result_blob: Option<String>,
    ) -> Result<RunRecord, DomainError> {
        let status: RunStatus = fields
            .get("status")
            .ok_or_else(|| DomainError::storage(format!("Run '{}' hash has no status", id)))?
            .parse()
            .map_err(|e| DomainError::storage(format!("Run '{}': {}", id, e)))?;

        let created_at = parse_timestamp(fields.get("created_at"))
            .ok_or_else(|| DomainError::storage(format!("Run '{}' has no created_at", id)))?;

        let completed_at = parse_timestamp(fields.get("completed_at"));

        let result: Option<DecisionSummary> = match result_blob {
            Some(blob) => Some(serde_json::from_str(&blob).map_err(|e| {
                DomainError::storage(format!("Failed to decode result for '{}': {}", id, e))
            })?),
            None => None,
        };

        let error = fields
            .get("error")
            .filter(|e| !e.is_empty())
            .cloned();

        let query = fields.get("query").cloned().unwrap_or_default();

        Ok(RunRecord::from_parts(
            id.clone(),
            query,
            status,
            result,
            error,
            created_at,
            completed_at,
        ))
    }
}

fn parse_timestamp(value: Option<&String>) -> Option<DateTime<Utc>> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[async_trait]
impl RunRepository for RedisRunRepository {
    async fn save(&self, record: &RunRecord) -> Result<(), DomainError> {
        let key = self.record_key(record.id());
        let result_key = self.result_key(record.id());
        let mut conn = self.connection.clone();

        let fields = [
            ("status", record.status().to_string()),
            ("query", record.query().to_string()),
            ("created_at", record.created_at().to_rfc3339()),
            (
                "completed_at",
                record
                    .completed_at()
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
            ),
            ("error", record.error().unwrap_or_default().to_string()),
        ];

        let result_blob = match record.result() {
            Some(summary) => Some(serde_json::to_string(summary).map_err(|e| {
                DomainError::storage(format!(
                    "Failed to encode result for '{}': {}",
                    record.id(),
                    e
                ))
            })?),
            None => None,
        };

        // One MULTI/EXEC pipeline: a reader never sees a half-written record
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset_multiple(&key, &fields);

        if let Some(ref blob) = result_blob {
            pipe.set(&result_key, blob);
        }

        pipe.sadd(self.all_key(), record.id().as_str());

        if record.is_terminal() {
            if let Some(completed_at) = record.completed_at() {
                pipe.zadd(
                    self.completed_key(),
                    record.id().as_str(),
                    completed_at.timestamp_millis(),
                );
            }

            let ttl_secs = self.config.terminal_ttl.as_secs().max(1) as i64;
            pipe.expire(&key, ttl_secs);
            if result_blob.is_some() {
                pipe.expire(&result_key, ttl_secs);
            }
        }

        pipe.query_async::<()>(&mut conn).await.map_err(|e| {
            DomainError::storage(format!("Failed to save run '{}': {}", record.id(), e))
        })?;

        Ok(())
    }

    async fn get(&self, id: &RunId) -> Result<Option<RunRecord>, DomainError> {
        let key = self.record_key(id);
        let result_key = self.result_key(id);
        let mut conn = self.connection.clone();

        let fields: std::collections::HashMap<String, String> =
            conn.hgetall(&key).await.map_err(|e| {
                DomainError::storage(format!("Failed to get run '{}': {}", id, e))
            })?;

        if fields.is_empty() {
            return Ok(None);
        }

        let result_blob: Option<String> = conn.get(&result_key).await.map_err(|e| {
            DomainError::storage(format!("Failed to get result for '{}': {}", id, e))
        })?;

        self.parse_record(id, fields, result_blob).map(Some)
    }

    async fn exists(&self, id: &RunId) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let exists: bool = conn
            .sismember(self.all_key(), id.as_str())
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to check existence of '{}': {}", id, e))
            })?;

        Ok(exists)
    }

    async fn list_all(&self) -> Result<Vec<RunRecord>, DomainError> {
        let mut conn = self.connection.clone();

        let ids: Vec<String> = conn.smembers(self.all_key()).await.map_err(|e| {
            DomainError::storage(format!("Failed to list run ids: {}", e))
        })?;

        let mut records = Vec::with_capacity(ids.len());
        for raw_id in ids {
            let Ok(id) = RunId::new(&raw_id) else {
                // A foreign entry in the id set; skip rather than fail the listing
                continue;
            };

            // Expired hashes leave a dangling set entry; skip those too
            if let Some(record) = self.get(&id).await? {
                records.push(record);
            }
        }

        Ok(records)
    }

    async fn list_completed_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<RunId>, DomainError> {
        let mut conn = self.connection.clone();

        let raw_ids: Vec<String> = conn
            .zrangebyscore(self.completed_key(), "-inf", before.timestamp_millis())
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to query completion index: {}", e))
            })?;

        Ok(raw_ids
            .into_iter()
            .filter_map(|raw| RunId::new(raw).ok())
            .collect())
    }

    async fn delete(&self, id: &RunId) -> Result<bool, DomainError> {
        if !self.exists(id).await? {
            return Ok(false);
        }

        let key = self.record_key(id);
        let result_key = self.result_key(id);
        let mut conn = self.connection.clone();

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(&key);
        pipe.del(&result_key);
        pipe.srem(self.all_key(), id.as_str());
        pipe.zrem(self.completed_key(), id.as_str());

        pipe.query_async::<()>(&mut conn).await.map_err(|e| {
            DomainError::storage(format!("Failed to delete run '{}': {}", id, e))
        })?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run::repository::tests::{
        completed_record, test_repository_basic_crud, test_repository_completed_index,
        test_repository_list_all, test_repository_round_trip,
    };

    // Note: These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    fn get_test_config() -> RedisRunStoreConfig {
        RedisRunStoreConfig::new("redis://127.0.0.1:6379")
            .with_key_prefix(format!("test-run-{}", uuid::Uuid::new_v4()))
            .with_terminal_ttl(Duration::from_secs(60))
    }

    #[test]
    fn test_key_layout() {
        let repo_config = RedisRunStoreConfig::new("redis://localhost").with_key_prefix("decisions");
        assert_eq!(repo_config.key_prefix, "decisions");
        assert_eq!(repo_config.terminal_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_parse_timestamp() {
        let now = Utc::now();
        let parsed = parse_timestamp(Some(&now.to_rfc3339())).unwrap();
        assert_eq!(parsed, now);

        assert!(parse_timestamp(Some(&String::new())).is_none());
        assert!(parse_timestamp(None).is_none());
        assert!(parse_timestamp(Some(&"not a date".to_string())).is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_basic_crud() {
        let repo = RedisRunRepository::new(get_test_config()).await.unwrap();
        test_repository_basic_crud(&repo).await;
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_list_all() {
        let repo = RedisRunRepository::new(get_test_config()).await.unwrap();
        test_repository_list_all(&repo).await;
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_completed_index() {
        let repo = RedisRunRepository::new(get_test_config()).await.unwrap();
        test_repository_completed_index(&repo).await;
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_round_trip() {
        let repo = RedisRunRepository::new(get_test_config()).await.unwrap();
        test_repository_round_trip(&repo).await;
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_round_trip_across_handles() {
        // Simulates a process restart: a fresh handle against the same
        // backing store must read back an equal record.
        let config = get_test_config();

        let record = completed_record("survive a restart");
        {
            let repo = RedisRunRepository::new(config.clone()).await.unwrap();
            repo.save(&record).await.unwrap();
        }

        let fresh = RedisRunRepository::new(config).await.unwrap();
        let fetched = fresh.get(record.id()).await.unwrap().unwrap();
        assert_eq!(fetched, record);

        fresh.delete(record.id()).await.unwrap();
    }
}
