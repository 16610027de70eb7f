//! Configuration loading and management
//!
//! ORDHub needs four externally supplied values (base URL and API key for
//! each service) plus the address the web front end listens on. They come
//! either from a YAML file or from `ORDHUB_*` environment variables.

use anyhow::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable names
pub const ENV_DB_API_URL: &str = "ORDHUB_DB_API_URL";
pub const ENV_DB_API_KEY: &str = "ORDHUB_DB_API_KEY";
pub const ENV_S3_API_URL: &str = "ORDHUB_S3_API_URL";
pub const ENV_S3_API_KEY: &str = "ORDHUB_S3_API_KEY";
pub const ENV_LISTEN: &str = "ORDHUB_LISTEN";

/// Errors found while assembling a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

/// Base URL and credential of one external service
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Base URL (e.g., "https://db.example.org/orders")
    pub base_url: String,

    /// Value sent in the `x-api-key` header
    pub api_key: String,
}

impl ServiceEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

// Keys stay out of logs and panics
impl fmt::Debug for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Complete configuration for the front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Record API (order metadata database)
    pub records: ServiceEndpoint,

    /// Object storage API (order files)
    pub objects: ServiceEndpoint,

    /// Listen address of the web front end
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

impl HubConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let config = Self {
            records: ServiceEndpoint::new(require(ENV_DB_API_URL)?, require(ENV_DB_API_KEY)?),
            objects: ServiceEndpoint::new(require(ENV_S3_API_URL)?, require(ENV_S3_API_KEY)?),
            listen: lookup(ENV_LISTEN).unwrap_or_else(default_listen),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that both base URLs parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [
            (ENV_DB_API_URL, &self.records),
            (ENV_S3_API_URL, &self.objects),
        ] {
            if Url::parse(&endpoint.base_url).is_err() {
                return Err(ConfigError::InvalidUrl {
                    name,
                    value: endpoint.base_url.clone(),
                });
            }
        }
        Ok(())
    }
}
