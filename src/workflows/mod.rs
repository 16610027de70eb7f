//! Workflows orchestrating the two service clients
//!
//! Each workflow owns `Arc`s of the client traits it needs and returns
//! `Result<_, HubError>`; the presentation layer turns errors into messages.

pub mod download;
pub mod listing;
pub mod search;
pub mod upload;

pub use download::{DownloadWorkflow, DownloadedFile, Payload};
pub use listing::{FetchTicket, LIST_ERROR_MESSAGE, ListingState, ListingWorkflow};
pub use search::{SearchWorkflow, validate_query};
pub use upload::{UploadFile, UploadForm, UploadReceipt, UploadWorkflow, object_key};
