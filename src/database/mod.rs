//! Database access for the hosted Supabase project.
//!
//! This module handles:
//! - The [`Database`] capability shared by request handlers
//! - The PostgREST-backed [`SupabaseClient`]
//! - A mock implementation for testing

pub mod client;
pub mod mock;

use async_trait::async_trait;

use crate::error::StoreError;

pub use client::SupabaseClient;
pub use mock::{MockBehavior, MockDatabase};

/// A single row as returned by the service. The schema is owned by the
/// remote project, so rows stay untyped.
pub type Record = serde_json::Value;

/// Row-selection capability of the external database.
#[async_trait]
pub trait Database: Send + Sync {
    /// Fetch up to `limit` records from `table`, with no filter.
    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Record>, StoreError>;
}
