//! Clients for the two external services
//!
//! Workflows only see the [`RecordApi`] and [`ObjectStore`] traits. The HTTP
//! implementations talk to the real services; the in-memory ones back tests
//! and local development.

pub mod objects;
pub mod records;

#[cfg(feature = "in-memory")]
pub mod in_memory;

use crate::core::{HubError, NetworkError, NewOrder, OrderList, Rejection, SearchQuery, Service};
use async_trait::async_trait;

pub use objects::HttpObjectStore;
pub use records::HttpRecordClient;

#[cfg(feature = "in-memory")]
pub use in_memory::{InMemoryObjectStore, InMemoryRecordApi};

/// Header carrying the static API key on every request
pub const API_KEY_HEADER: &str = "x-api-key";

/// Order metadata service
///
/// No retry and no backoff: a failed attempt is reported to the caller as is.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Fetch one page of orders
    async fn list_orders(&self, limit: usize, offset: usize) -> Result<OrderList, HubError>;

    /// Create an order record
    async fn create_order(&self, order: &NewOrder) -> Result<(), HubError>;

    /// Fetch one page of orders matching the query filters
    async fn search_orders(
        &self,
        query: &SearchQuery,
        limit: usize,
        offset: usize,
    ) -> Result<OrderList, HubError>;
}

/// Raw answer of an object read
///
/// The client never interprets the payload; that is the download
/// workflow's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectResponse {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

/// Binary object service
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Address under which `key` is stored
    fn object_url(&self, key: &str) -> String;

    /// Whether reading `reference` stays on this store
    ///
    /// True for bare keys and for URLs under the store's base. API keys are
    /// only ever sent to such references.
    fn is_own_reference(&self, reference: &str) -> bool;

    /// Write `bytes` under `key`, silently replacing any existing object
    ///
    /// Returns the object's address.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, HubError>;

    /// Read an object by URL or bare key
    ///
    /// `credential` is sent as the API key when present.
    async fn get_object(
        &self,
        reference: &str,
        credential: Option<&str>,
    ) -> Result<ObjectResponse, HubError>;

    /// Remove the object stored under `key`
    async fn delete_object(&self, key: &str) -> Result<(), HubError>;
}

/// HTTP client shared by both services
///
/// Redirects are not followed: a 3xx comes back as a status error, so the
/// `x-api-key` header never reaches a host the answer points at.
pub fn http_client() -> Result<reqwest::Client, HubError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| HubError::Internal(format!("failed to build HTTP client: {}", e)))
}

/// Map a reqwest transport failure to a [`NetworkError`]
pub(crate) fn transport_error(service: Service) -> impl Fn(reqwest::Error) -> HubError {
    move |err| NetworkError::transport(service, err.to_string()).into()
}

/// Turn non-2xx responses into errors
///
/// `rejections` selects whether a 4xx is a server-side refusal of the input
/// (create calls) or a plain network error (reads).
pub(crate) fn check_status(
    service: Service,
    response: reqwest::Response,
    rejections: bool,
) -> Result<reqwest::Response, HubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if rejections && status.is_client_error() {
        return Err(Rejection::Server {
            service,
            status: status.as_u16(),
        }
        .into());
    }
    Err(NetworkError::status(service, status.as_u16()).into())
}
