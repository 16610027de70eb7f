//! AppBuilder for wiring the service clients into an HTTP server

use super::pages;
use super::state::AppState;
use super::templates::Templates;
use crate::clients::{HttpObjectStore, HttpRecordClient, ObjectStore, RecordApi, http_client};
use crate::config::HubConfig;
use crate::core::PAGE_SIZE;
use crate::workflows::{DownloadWorkflow, ListingWorkflow, SearchWorkflow, UploadWorkflow};
use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Largest accepted upload request body
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Builder for the ORDHub web front end
///
/// # Example
///
/// ```ignore
/// let app = AppBuilder::new()
///     .with_records(InMemoryRecordApi::new())
///     .with_objects(InMemoryObjectStore::default())
///     .with_storage_key("s3-key")
///     .build()?;
/// ```
pub struct AppBuilder {
    records: Option<Arc<dyn RecordApi>>,
    objects: Option<Arc<dyn ObjectStore>>,
    storage_key: String,
    fallback_key: Option<String>,
    page_size: Option<usize>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            records: None,
            objects: None,
            storage_key: String::new(),
            fallback_key: None,
            page_size: None,
        }
    }

    /// HTTP clients for both services, sharing one connection pool
    ///
    /// Downloads authenticate with the storage key and retry once with the
    /// record key when the two differ.
    pub fn from_config(config: &HubConfig) -> Result<Self> {
        let client = http_client()?;
        Ok(Self::new()
            .with_records(HttpRecordClient::with_client(
                client.clone(),
                config.records.clone(),
            ))
            .with_objects(HttpObjectStore::with_client(client, config.objects.clone()))
            .with_storage_key(config.objects.api_key.clone())
            .with_fallback_key(config.records.api_key.clone()))
    }

    /// Set the Record API client (required)
    pub fn with_records(mut self, records: impl RecordApi + 'static) -> Self {
        self.records = Some(Arc::new(records));
        self
    }

    /// Set an already shared Record API client
    pub fn with_shared_records(mut self, records: Arc<dyn RecordApi>) -> Self {
        self.records = Some(records);
        self
    }

    /// Set the object storage client (required)
    pub fn with_objects(mut self, objects: impl ObjectStore + 'static) -> Self {
        self.objects = Some(Arc::new(objects));
        self
    }

    /// Set an already shared object storage client
    pub fn with_shared_objects(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Credential used for downloads
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Credential tried once after the storage key is refused
    pub fn with_fallback_key(mut self, key: impl Into<String>) -> Self {
        self.fallback_key = Some(key.into());
        self
    }

    /// Rows per Orders page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Assemble the workflows and templates
    pub fn build_state(self) -> Result<AppState> {
        let records = self
            .records
            .ok_or_else(|| anyhow::anyhow!("Record API client is required. Call .with_records()"))?;
        let objects = self
            .objects
            .ok_or_else(|| anyhow::anyhow!("Object store is required. Call .with_objects()"))?;

        let mut download = DownloadWorkflow::new(objects.clone(), self.storage_key);
        if let Some(key) = self.fallback_key {
            download = download.with_fallback_key(key);
        }

        Ok(AppState {
            listing: ListingWorkflow::new(records.clone()),
            page_size: self.page_size.unwrap_or(PAGE_SIZE).max(1),
            search: SearchWorkflow::new(records.clone()),
            upload: UploadWorkflow::new(records, objects),
            download,
            templates: Arc::new(Templates::new()?),
        })
    }

    /// Build the router with every page route
    pub fn build(self) -> Result<Router> {
        let state = self.build_state()?;
        Ok(routes(state))
    }

    /// Serve the application with graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("ORDHub listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Page routes over a ready state
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/health", get(pages::health))
        .route("/orders", get(pages::orders_page))
        .route("/orders/download", get(pages::download))
        .route("/search", get(pages::search_page))
        .route(
            "/upload",
            get(pages::upload_form)
                .post(pages::upload_submit)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
