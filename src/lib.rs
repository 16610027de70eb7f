//! # ORDHub
//!
//! Web front end for a military orders repository. Order metadata lives in a
//! Record API, order files in an object storage service; ORDHub lists, searches,
//! uploads and downloads orders across the two.
//!
//! ## Features
//!
//! - **Orders tab**: paginated table, 50 rows per page, stale answers dropped
//! - **Search tab**: free text plus fiscal year, type and number filters
//! - **Upload tab**: validated form, file stored first, record created second
//! - **Downloads**: raw files, Base64-wrapped PDFs and signed-URL redirects
//! - **Pluggable clients**: HTTP clients in production, in-memory doubles in tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ordhub::prelude::*;
//!
//! let config = HubConfig::from_env()?;
//! AppBuilder::from_config(&config)?
//!     .serve(&config.listen)
//!     .await?;
//! ```

pub mod clients;
pub mod config;
pub mod core;
pub mod server;
pub mod workflows;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        Field, HubError, NetworkError, NewOrder, Order, OrderList, PAGE_SIZE, Page, PageWindow,
        Rejection, SearchQuery, Service, ValidationReport,
    };

    // === Clients ===
    pub use crate::clients::{
        HttpObjectStore, HttpRecordClient, ObjectResponse, ObjectStore, RecordApi,
    };
    #[cfg(feature = "in-memory")]
    pub use crate::clients::{InMemoryObjectStore, InMemoryRecordApi};

    // === Workflows ===
    pub use crate::workflows::{
        DownloadWorkflow, DownloadedFile, ListingState, ListingWorkflow, SearchWorkflow,
        UploadFile, UploadForm, UploadWorkflow,
    };

    // === Config ===
    pub use crate::config::{HubConfig, ServiceEndpoint};

    // === Server ===
    pub use crate::server::{AppBuilder, AppState};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
}
