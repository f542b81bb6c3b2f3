//! Unified error types for the backend.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Message prefix for failures reported by the database service.
pub const DATABASE_ERROR_PREFIX: &str = "Errore del database";

/// Fallback message for any other failure inside a request handler.
pub const INTERNAL_ERROR_MESSAGE: &str = "Errore interno del server.";

/// Unified error type for the backend process.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database client error.
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// Metrics exporter could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    #[error("{0} not found in environment. Make sure the .env file exists and is configured.")]
    Missing(String),

    /// A variable is present but unusable.
    #[error("{var} is invalid: {reason}")]
    Invalid {
        /// Environment variable name.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Environment could not be deserialized.
    #[error("failed to read environment: {0}")]
    Env(String),
}

impl From<envy::Error> for ConfigError {
    fn from(err: envy::Error) -> Self {
        match err {
            envy::Error::MissingValue(field) => ConfigError::Missing(field.to_uppercase()),
            other => ConfigError::Env(other.to_string()),
        }
    }
}

/// Category of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DbErrorKind {
    /// The service could not be reached or timed out.
    Transport,
    /// The service rejected the credentials.
    Auth,
    /// The service rejected the query.
    Service,
    /// The service answered with a body that could not be decoded.
    Decode,
    /// The client could not be built.
    Client,
}

/// Structured failure reported by the database collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DbError {
    /// Failure category.
    pub kind: DbErrorKind,
    /// Service error code (e.g. PostgREST `42P01`), when provided.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl DbError {
    /// Create an error without a service code.
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a service error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_decode() {
            DbErrorKind::Decode
        } else if err.is_builder() {
            DbErrorKind::Client
        } else {
            DbErrorKind::Transport
        };

        // The message reaches HTTP callers, so the project URL is stripped.
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.without_url().to_string()
        };
        DbError::new(kind, message)
    }
}

/// Error returned by a [`Database`](crate::database::Database) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database reported a structured failure.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Anything outside the collaborator's error contract.
    #[error("unexpected failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database failure; its message is relayed to the caller.
    #[error("{}: {}", DATABASE_ERROR_PREFIX, .0)]
    Database(String),

    /// Any other failure; details stay in the logs.
    #[error("{}", INTERNAL_ERROR_MESSAGE)]
    Internal,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => ApiError::Database(e.message),
            StoreError::Unexpected(_) => ApiError::Internal,
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Numeric HTTP status.
    pub status_code: u16,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            status_code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_error_embeds_detail() {
        let err = ApiError::from(StoreError::Database(DbError::new(
            DbErrorKind::Service,
            "relation \"public.Name\" does not exist",
        )));

        assert_eq!(
            err.to_string(),
            "Errore del database: relation \"public.Name\" does not exist"
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unexpected_error_hides_detail() {
        let err = ApiError::from(StoreError::Unexpected(anyhow::anyhow!("socket exploded")));

        assert_eq!(err.to_string(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn missing_value_names_variable() {
        let err = ConfigError::Missing("SUPABASE_KEY".to_string());
        assert!(err.to_string().starts_with("SUPABASE_KEY not found"));
    }

    #[test]
    fn error_kind_renders_snake_case() {
        assert_eq!(DbErrorKind::Transport.to_string(), "transport");
        assert_eq!(DbErrorKind::Decode.as_ref(), "decode");
    }
}
