//! Mock database for unit testing.
//!
//! This module provides a mock that can be used in tests
//! without making real network requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::error::{DbError, StoreError};

use super::{Database, Record};

/// What the mock does when queried.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return up to `limit` of these records.
    Records(Vec<Record>),
    /// Return a structured database error.
    Fail(DbError),
    /// Return an error outside the database contract.
    Unexpected(String),
    /// Panic inside the query.
    Panic(String),
}

impl Default for MockBehavior {
    fn default() -> Self {
        MockBehavior::Records(Vec::new())
    }
}

/// Mock database for testing.
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    /// Mock behavior.
    behavior: MockBehavior,
    /// Simulated latency in milliseconds.
    latency_ms: u64,
    /// Number of `select` calls received.
    calls: Arc<AtomicUsize>,
    /// Tables and limits requested, in order.
    requests: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockDatabase {
    /// Create a mock that returns no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that returns the given records.
    pub fn with_records(records: Vec<Record>) -> Self {
        Self::with_behavior(MockBehavior::Records(records))
    }

    /// Create a mock that fails with a database error.
    pub fn failing(error: DbError) -> Self {
        Self::with_behavior(MockBehavior::Fail(error))
    }

    /// Create a mock with custom behavior.
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Set simulated latency.
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of queries received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tables and limits requested so far.
    pub fn requests(&self) -> Vec<(String, usize)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Record>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((table.to_string(), limit));
        }

        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }

        match &self.behavior {
            MockBehavior::Records(records) => Ok(records.iter().take(limit).cloned().collect()),
            MockBehavior::Fail(error) => Err(StoreError::Database(error.clone())),
            MockBehavior::Unexpected(reason) => Err(StoreError::Unexpected(anyhow!(reason.clone()))),
            MockBehavior::Panic(reason) => panic!("{}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn records_are_truncated_to_limit() {
        let db = MockDatabase::with_records(vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);

        let rows = db.select("Name", 2).await.unwrap();

        assert_eq!(rows, vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(db.calls(), 1);
        assert_eq!(db.requests(), vec![("Name".to_string(), 2)]);
    }

    #[tokio::test]
    async fn failing_mock_returns_database_error() {
        let db = MockDatabase::failing(DbError::new(DbErrorKind::Service, "boom"));

        let err = db.select("Name", 5).await.unwrap_err();

        assert!(matches!(err, StoreError::Database(ref e) if e.message == "boom"));
    }

    #[tokio::test]
    async fn clones_share_call_counter() {
        let db = MockDatabase::new();
        let clone = db.clone();

        clone.select("Name", 5).await.unwrap();

        assert_eq!(db.calls(), 1);
    }
}
