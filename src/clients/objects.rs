//! HTTP client for the object storage API

use super::{
    API_KEY_HEADER, ObjectResponse, ObjectStore, check_status, http_client, transport_error,
};
use crate::config::ServiceEndpoint;
use crate::core::{HubError, NetworkError, Service};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderName};

/// Object store over HTTP
///
/// - `PUT {base}/{key}` writes raw bytes
/// - `GET {url}` reads
/// - `DELETE {base}/{key}` removes
#[derive(Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: ServiceEndpoint,
}

impl HttpObjectStore {
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self, HubError> {
        Ok(Self::with_client(http_client()?, endpoint))
    }

    /// Share an existing connection pool
    pub fn with_client(client: reqwest::Client, endpoint: ServiceEndpoint) -> Self {
        Self { client, endpoint }
    }

    /// Absolute URLs are used as given, anything else is a key under the base
    fn resolve(&self, reference: &str) -> String {
        match absolute_url(reference) {
            Some(_) => reference.to_string(),
            None => self.object_url(reference.trim_start_matches('/')),
        }
    }
}

fn absolute_url(reference: &str) -> Option<Url> {
    Url::parse(reference)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Same origin as `base` and a path at or below the base path
fn is_under(url: &Url, base: &Url) -> bool {
    if url.scheme() != base.scheme()
        || url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }
    let root = base.path().trim_end_matches('/');
    let path = url.path();
    root.is_empty()
        || path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint.base(), key)
    }

    fn is_own_reference(&self, reference: &str) -> bool {
        let Some(url) = absolute_url(reference) else {
            return true;
        };
        Url::parse(self.endpoint.base()).is_ok_and(|base| is_under(&url, &base))
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, HubError> {
        let url = self.object_url(key);
        tracing::debug!(%url, size = bytes.len(), content_type, "Uploading object");

        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .header(API_KEY_HEADER, &self.endpoint.api_key)
            .body(bytes)
            .send()
            .await
            .map_err(transport_error(Service::Objects))?;
        check_status(Service::Objects, response, false)?;
        Ok(url)
    }

    async fn get_object(
        &self,
        reference: &str,
        credential: Option<&str>,
    ) -> Result<ObjectResponse, HubError> {
        let url = self.resolve(reference);
        tracing::debug!(%url, authenticated = credential.is_some(), "Fetching object");

        let mut request = self.client.get(&url);
        if let Some(key) = credential {
            request = request.header(API_KEY_HEADER, key);
        }
        let response = request
            .send()
            .await
            .map_err(transport_error(Service::Objects))?;
        let response = check_status(Service::Objects, response, false)?;

        let content_type = header_text(response.headers(), CONTENT_TYPE);
        let content_disposition = header_text(response.headers(), CONTENT_DISPOSITION);
        let body = response.bytes().await.map_err(|e| {
            HubError::from(NetworkError::transport(
                Service::Objects,
                format!("failed to read body: {}", e),
            ))
        })?;

        Ok(ObjectResponse {
            content_type,
            content_disposition,
            body: body.to_vec(),
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), HubError> {
        let url = self.object_url(key);
        tracing::debug!(%url, "Deleting object");

        let response = self
            .client
            .delete(&url)
            .header(API_KEY_HEADER, &self.endpoint.api_key)
            .send()
            .await
            .map_err(transport_error(Service::Objects))?;
        check_status(Service::Objects, response, false)?;
        Ok(())
    }
}
