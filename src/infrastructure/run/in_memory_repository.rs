//! In-memory run repository implementation
//!
//! The volatile store: development and testing only, nothing survives a
//! restart. Still safe for concurrent access from the scheduling path and
//! any number of request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::error::DomainError;
use crate::domain::run::{RunId, RunRecord, RunRepository};

/// In-memory implementation of RunRepository
#[derive(Debug)]
pub struct InMemoryRunRepository {
    records: Arc<RwLock<HashMap<String, RunRecord>>>,
}

impl InMemoryRunRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryRunRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn save(&self, record: &RunRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        records.insert(record.id().as_str().to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &RunId) -> Result<Option<RunRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(id.as_str()).cloned())
    }

    async fn exists(&self, id: &RunId) -> Result<bool, DomainError> {
        let records = self.records.read().await;
        Ok(records.contains_key(id.as_str()))
    }

    async fn list_all(&self) -> Result<Vec<RunRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn list_completed_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<RunId>, DomainError> {
        let records = self.records.read().await;
        let ids = records
            .values()
            .filter(|r| r.is_terminal())
            .filter(|r| r.completed_at().is_some_and(|t| t < before))
            .map(|r| r.id().clone())
            .collect();
        Ok(ids)
    }

    async fn delete(&self, id: &RunId) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        Ok(records.remove(id.as_str()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run::repository::tests::{
        completed_record, create_test_record, test_repository_basic_crud,
        test_repository_completed_index, test_repository_list_all, test_repository_round_trip,
    };

    #[tokio::test]
    async fn test_basic_crud() {
        let repo = InMemoryRunRepository::new();
        test_repository_basic_crud(&repo).await;
    }

    #[tokio::test]
    async fn test_list_all() {
        let repo = InMemoryRunRepository::new();
        test_repository_list_all(&repo).await;
    }

    #[tokio::test]
    async fn test_completed_index() {
        let repo = InMemoryRunRepository::new();
        test_repository_completed_index(&repo).await;
    }

    #[tokio::test]
    async fn test_round_trip() {
        let repo = InMemoryRunRepository::new();
        test_repository_round_trip(&repo).await;
    }

    #[tokio::test]
    async fn test_running_record_never_in_completion_index() {
        let repo = InMemoryRunRepository::new();

        let mut running = create_test_record("long running");
        running.mark_running().unwrap();
        repo.save(&running).await.unwrap();

        let cutoff = Utc::now() + chrono::Duration::days(365);
        let old = repo.list_completed_before(cutoff).await.unwrap();
        assert!(old.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_saves_do_not_cross_contaminate() {
        let repo = Arc::new(InMemoryRunRepository::new());

        let r1 = create_test_record("first query");
        let r2 = completed_record("second query");

        let repo1 = Arc::clone(&repo);
        let repo2 = Arc::clone(&repo);
        let (c1, c2) = (r1.clone(), r2.clone());

        let (a, b) = tokio::join!(
            tokio::spawn(async move { repo1.save(&c1).await }),
            tokio::spawn(async move { repo2.save(&c2).await }),
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        let got1 = repo.get(r1.id()).await.unwrap().unwrap();
        let got2 = repo.get(r2.id()).await.unwrap().unwrap();
        assert_eq!(got1.query(), "first query");
        assert_eq!(got2.query(), "second query");
    }
}
