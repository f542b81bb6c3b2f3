//! HTTP API handlers.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use serde::Serialize;
use tracing::error;

use crate::database::{Database, Record};
use crate::error::ApiError;

/// Body of `GET /`.
pub const GREETING: &str = "Backend NestJS per AI Sales Assistant è attivo!";

/// Identifier reported by `GET /health`.
pub const SERVICE_ID: &str = "sales-backend";

/// Table queried by `GET /test-db`.
pub const TEST_TABLE: &str = "Name";

/// Row limit used by `GET /test-db`.
pub const TEST_LIMIT: usize = 5;

/// Message returned by a successful `GET /test-db`.
pub const TEST_DB_SUCCESS: &str = "Connessione al database e query eseguita con successo!";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database collaborator.
    pub db: Arc<dyn Database>,
}

impl AppState {
    /// Create new app state around a shared database handle.
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Create new app state taking ownership of a database.
    pub fn from_database<D: Database + 'static>(db: D) -> Self {
        Self::new(Arc::new(db))
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
    /// Service identifier.
    pub service: &'static str,
    /// RFC 3339 time at which the response was built.
    pub timestamp: String,
}

/// Database diagnostic response.
#[derive(Debug, Serialize)]
pub struct TestDbResponse {
    /// Success message.
    pub message: &'static str,
    /// Records returned by the query.
    pub data: Vec<Record>,
}

/// Greeting handler - always returns 200.
pub async fn hello() -> &'static str {
    GREETING
}

/// Health check handler - always returns 200.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_ID,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Database diagnostic handler - queries a few rows and relays the result.
pub async fn test_db(State(state): State<AppState>) -> Result<Json<TestDbResponse>, ApiError> {
    let query = state.db.select(TEST_TABLE, TEST_LIMIT);

    match AssertUnwindSafe(query).catch_unwind().await {
        Ok(Ok(data)) => Ok(Json(TestDbResponse {
            message: TEST_DB_SUCCESS,
            data,
        })),
        Ok(Err(e)) => {
            error!(error = %e, table = TEST_TABLE, "Database diagnostic failed");
            Err(e.into())
        }
        Err(panic) => {
            let reason = panic
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| panic.downcast_ref::<&str>().copied())
                .unwrap_or("unknown");
            error!(reason, table = TEST_TABLE, "Database diagnostic panicked");
            Err(ApiError::Internal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MockDatabase;

    #[tokio::test]
    async fn hello_returns_greeting() {
        assert_eq!(hello().await, "Backend NestJS per AI Sales Assistant è attivo!");
    }

    #[tokio::test]
    async fn health_reports_service() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.service, SERVICE_ID);
        assert!(body.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_db_queries_fixed_table() {
        let db = MockDatabase::new();
        let state = AppState::from_database(db.clone());

        let result = test_db(State(state)).await;

        assert!(result.is_ok());
        assert_eq!(db.requests(), vec![(TEST_TABLE.to_string(), TEST_LIMIT)]);
    }
}
