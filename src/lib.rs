//! HTTP backend for the AI Sales Assistant.
//!
//! The service exposes three routes and delegates all persistence to a
//! hosted Supabase project:
//!
//! ```text
//! GET /         -> greeting string
//! GET /health   -> {status, service, timestamp}
//! GET /test-db  -> {message, data} (first rows of a diagnostic table)
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`database`]: Database capability, Supabase client, and mock
//! - [`api`]: HTTP handlers and router
//! - [`metrics`]: Prometheus metrics
//! - [`server`]: Server startup and listener
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod server;
pub mod utils;

pub use config::Config;
pub use error::{BackendError, Result};
