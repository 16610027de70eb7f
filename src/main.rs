//! ORDHub server binary
//!
//! Reads the YAML file named by `ORDHUB_CONFIG` when set, otherwise the
//! `ORDHUB_*` environment variables.

use anyhow::{Context, Result};
use ordhub::config::HubConfig;
use ordhub::server::AppBuilder;
use tracing_subscriber::EnvFilter;

const ENV_CONFIG_FILE: &str = "ORDHUB_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ordhub=info,tower_http=info")),
        )
        .init();

    let config = match std::env::var(ENV_CONFIG_FILE) {
        Ok(path) => HubConfig::from_yaml_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        Err(_) => HubConfig::from_env().context("failed to load configuration from environment")?,
    };

    tracing::info!(
        records = %config.records.base(),
        objects = %config.objects.base(),
        "Configuration loaded"
    );

    AppBuilder::from_config(&config)?
        .serve(&config.listen)
        .await
}
