//! Supabase REST (PostgREST) client.

use std::time::{Duration, Instant};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::{DbError, DbErrorKind, StoreError};
use crate::metrics;

use super::{Database, Record};

/// Path prefix of the PostgREST API inside a Supabase project.
const REST_PREFIX: [&str; 2] = ["rest", "v1"];

/// Client for a Supabase project's REST interface.
#[derive(Clone)]
pub struct SupabaseClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Project base URL.
    base_url: Url,
    /// Key sent as `apikey` and bearer token.
    key: String,
}

/// Error body returned by PostgREST.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgrestError {
    /// Postgres or PostgREST error code. The gateway sometimes sends numbers.
    pub code: Option<serde_json::Value>,
    /// Human-readable message.
    pub message: Option<String>,
    /// Additional details.
    pub details: Option<serde_json::Value>,
    /// Suggested fix.
    pub hint: Option<serde_json::Value>,
}

impl PostgrestError {
    /// Error code rendered as text.
    pub fn code_str(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(code) => Some(code.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl SupabaseClient {
    /// Create a client from validated config.
    pub fn new(config: &Config) -> Result<Self, DbError> {
        let base_url = Url::parse(&config.supabase_url)
            .map_err(|e| DbError::new(DbErrorKind::Client, format!("invalid project URL: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_millis(config.http_connect_timeout_ms))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        info!(url = %base_url, "Supabase client initialized");

        Ok(Self {
            http,
            base_url,
            key: config.supabase_key.clone(),
        })
    }

    /// Get the project base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the REST endpoint for a table.
    pub fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        if table.is_empty() {
            return Err(StoreError::Unexpected(anyhow!("table name is empty")));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("project URL {} cannot be a base", self.base_url))?
            .pop_if_empty()
            .extend(REST_PREFIX)
            .push(table);
        url.set_query(None);
        Ok(url)
    }

    async fn fetch(&self, table: &str, limit: usize) -> Result<Vec<Record>, StoreError> {
        let url = self.table_url(table)?;
        let limit = limit.to_string();

        let response = self
            .http
            .get(url)
            .query(&[("select", "*"), ("limit", limit.as_str())])
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(DbError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(status = %status, error = %e.without_url(), "Failed to read error body");
                    String::new()
                }
            };
            return Err(error_from_response(status, &body).into());
        }

        let records: Vec<Record> = response.json().await.map_err(DbError::from)?;
        Ok(records)
    }
}

#[async_trait]
impl Database for SupabaseClient {
    #[instrument(skip_all, fields(table = %table, limit = limit))]
    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Record>, StoreError> {
        let start = Instant::now();
        let result = self.fetch(table, limit).await;

        match &result {
            Ok(records) => {
                debug!(count = records.len(), "Query succeeded");
                metrics::record_db_query(table, start, "ok");
            }
            Err(StoreError::Database(e)) => {
                warn!(kind = %e.kind, code = ?e.code, error = %e.message, "Query failed");
                metrics::record_db_query(table, start, e.kind.as_ref());
            }
            Err(StoreError::Unexpected(e)) => {
                warn!(error = %e, "Query could not be issued");
                metrics::record_db_query(table, start, "unexpected");
            }
        }

        result
    }
}

/// Map a non-2xx response to a structured error.
pub fn error_from_response(status: StatusCode, body: &str) -> DbError {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DbErrorKind::Auth,
        _ => DbErrorKind::Service,
    };

    let parsed = serde_json::from_str::<PostgrestError>(body).ok();
    let message = parsed.as_ref().and_then(|p| p.message.clone());

    match message {
        Some(message) => {
            let err = DbError::new(kind, message);
            match parsed.as_ref().and_then(PostgrestError::code_str) {
                Some(code) => err.with_code(code),
                None => err,
            }
        }
        None => DbError::new(kind, format!("HTTP {}", status)),
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(url: &str) -> Config {
        Config::from_vars(vec![
            ("SUPABASE_URL".to_string(), url.to_string()),
            ("SUPABASE_KEY".to_string(), "test-key".to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn client_creation_works() {
        let client = SupabaseClient::new(&test_config("https://project.supabase.co")).unwrap();
        assert_eq!(client.base_url().as_str(), "https://project.supabase.co/");
    }

    #[test]
    fn table_url_appends_rest_prefix() {
        let client = SupabaseClient::new(&test_config("https://project.supabase.co")).unwrap();
        let url = client.table_url("Name").unwrap();
        assert_eq!(url.as_str(), "https://project.supabase.co/rest/v1/Name");
    }

    #[test]
    fn table_url_keeps_base_path() {
        let client = SupabaseClient::new(&test_config("http://localhost:54321/proxy/")).unwrap();
        let url = client.table_url("leads").unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/proxy/rest/v1/leads");
    }

    #[test]
    fn table_url_encodes_table_name() {
        let client = SupabaseClient::new(&test_config("https://project.supabase.co")).unwrap();
        let url = client.table_url("my table").unwrap();
        assert_eq!(url.as_str(), "https://project.supabase.co/rest/v1/my%20table");
    }

    #[test]
    fn empty_table_is_unexpected() {
        let client = SupabaseClient::new(&test_config("https://project.supabase.co")).unwrap();
        assert!(matches!(client.table_url(""), Err(StoreError::Unexpected(_))));
    }

    #[test]
    fn postgrest_error_body_is_parsed() {
        let body = r#"{"code":"42P01","details":null,"hint":null,"message":"relation \"public.Name\" does not exist"}"#;
        let err = error_from_response(StatusCode::NOT_FOUND, body);

        assert_eq!(err.kind, DbErrorKind::Service);
        assert_eq!(err.code.as_deref(), Some("42P01"));
        assert_eq!(err.message, "relation \"public.Name\" does not exist");
    }

    #[test]
    fn auth_status_maps_to_auth_kind() {
        let body = r#"{"message":"Invalid API key","hint":"Double check your Supabase `anon` or `service_role` API key."}"#;
        let err = error_from_response(StatusCode::UNAUTHORIZED, body);

        assert_eq!(err.kind, DbErrorKind::Auth);
        assert_eq!(err.code, None);
        assert_eq!(err.message, "Invalid API key");
    }

    #[test]
    fn numeric_gateway_code_is_rendered() {
        let err = error_from_response(StatusCode::FORBIDDEN, r#"{"code":403,"message":"forbidden"}"#);

        assert_eq!(err.kind, DbErrorKind::Auth);
        assert_eq!(err.code.as_deref(), Some("403"));
    }

    #[test]
    fn unparseable_error_body_uses_status() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");

        assert_eq!(err.kind, DbErrorKind::Service);
        assert_eq!(err.message, "HTTP 502 Bad Gateway");
    }

    #[test]
    fn debug_output_redacts_key() {
        let client = SupabaseClient::new(&test_config("https://project.supabase.co")).unwrap();
        assert!(!format!("{:?}", client).contains("test-key"));
    }
}
