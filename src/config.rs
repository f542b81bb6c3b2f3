//! Application configuration loaded from environment variables.

use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct Config {
    // === Supabase Credentials ===
    /// Project URL (e.g. `https://abcd.supabase.co`).
    #[serde(default)]
    pub supabase_url: String,

    /// Service or anon key sent with every request.
    #[serde(default)]
    pub supabase_key: String,

    // === HTTP Client ===
    /// Whole-request timeout for database calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    /// Connection establishment timeout for database calls.
    #[serde(default = "default_connect_timeout")]
    pub http_connect_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === Metrics ===
    /// Serve Prometheus metrics on a separate listener.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Port of the Prometheus listener.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_http_timeout() -> u64 {
    10_000
}

fn default_connect_timeout() -> u64 {
    3_000
}

fn default_port() -> u16 {
    3001
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from explicit key/value pairs.
    ///
    /// Keys use the environment spelling (`SUPABASE_URL`, `PORT`, ...).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supabase_url.trim().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL".to_string()));
        }

        if self.supabase_key.trim().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_KEY".to_string()));
        }

        let url = Url::parse(&self.supabase_url).map_err(|e| ConfigError::Invalid {
            var: "SUPABASE_URL".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: "SUPABASE_URL".to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        if self.http_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "HTTP_TIMEOUT_MS".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("http_connect_timeout_ms", &self.http_connect_timeout_ms)
            .field("port", &self.port)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}
