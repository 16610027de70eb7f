//! Shared state handed to every page handler

use super::templates::Templates;
use crate::workflows::{DownloadWorkflow, ListingWorkflow, SearchWorkflow, UploadWorkflow};
use std::sync::Arc;

/// Workflows and templates
///
/// Nothing here is per visitor: the Orders tab position travels in each
/// request's `offset` parameter.
#[derive(Clone)]
pub struct AppState {
    pub listing: ListingWorkflow,
    pub page_size: usize,
    pub search: SearchWorkflow,
    pub upload: UploadWorkflow,
    pub download: DownloadWorkflow,
    pub templates: Arc<Templates>,
}
