//! In-memory implementations of the service clients for testing and development

use super::{ObjectResponse, ObjectStore, RecordApi};
use crate::core::{
    HubError, NetworkError, NewOrder, Order, OrderList, Rejection, SearchQuery, Service,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

fn poisoned(e: impl std::fmt::Display) -> HubError {
    HubError::Internal(format!("Failed to acquire lock: {}", e))
}

/// In-memory Record API
///
/// Orders are kept in insertion order. Failures can be injected to exercise
/// the error paths of the workflows.
#[derive(Clone, Default)]
pub struct InMemoryRecordApi {
    orders: Arc<RwLock<Vec<Order>>>,
    failure: Arc<RwLock<Option<u16>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl InMemoryRecordApi {
    /// Create a new, empty record service
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed existing orders
    pub fn with_orders(orders: Vec<Order>) -> Self {
        let api = Self::new();
        if let Ok(mut stored) = api.orders.write() {
            *stored = orders;
        }
        api
    }

    /// Make every following call fail with the given HTTP status
    ///
    /// `None` restores normal operation.
    pub fn set_failure(&self, status: Option<u16>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = status;
        }
    }

    /// Snapshot of stored orders
    pub fn orders(&self) -> Vec<Order> {
        self.orders.read().map(|o| o.clone()).unwrap_or_default()
    }

    /// Names of the operations called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    fn enter(&self, call: &str) -> Result<(), HubError> {
        self.calls.write().map_err(poisoned)?.push(call.to_string());
        match *self.failure.read().map_err(poisoned)? {
            Some(status) if (400..500).contains(&status) && call == "create" => {
                Err(Rejection::Server {
                    service: Service::Records,
                    status,
                }
                .into())
            }
            Some(status) => Err(NetworkError::status(Service::Records, status).into()),
            None => Ok(()),
        }
    }

    fn page(orders: Vec<Order>, limit: usize, offset: usize) -> OrderList {
        let total = orders.len();
        OrderList {
            orders: orders.into_iter().skip(offset).take(limit).collect(),
            total,
        }
    }
}

fn matches_query(order: &Order, query: &SearchQuery) -> bool {
    let q = query.normalized();
    let text = q.q.as_deref().map(str::to_lowercase);
    text.is_none_or(|t| {
        order.order_title.to_lowercase().contains(&t) || order.order_number.contains(&t)
    }) && q.order_fy.as_deref().is_none_or(|fy| order.order_fy == fy)
        && q.order_type.as_deref().is_none_or(|t| order.order_type == t)
        && q.order_number
            .as_deref()
            .is_none_or(|n| order.order_number == n)
}

#[async_trait]
impl RecordApi for InMemoryRecordApi {
    async fn list_orders(&self, limit: usize, offset: usize) -> Result<OrderList, HubError> {
        self.enter("list")?;
        Ok(Self::page(self.orders(), limit, offset))
    }

    async fn create_order(&self, order: &NewOrder) -> Result<(), HubError> {
        self.enter("create")?;
        let record = Order {
            id: Uuid::new_v4().to_string(),
            order_fy: order.order_fy.clone(),
            order_type: order.order_type.clone(),
            order_number: order.order_number.clone(),
            order_date: order.order_date.format("%Y-%m-%d").to_string(),
            order_title: order.order_title.clone(),
            classification: order.classification.clone(),
            order_location: order.order_location.clone(),
        };
        self.orders.write().map_err(poisoned)?.push(record);
        Ok(())
    }

    async fn search_orders(
        &self,
        query: &SearchQuery,
        limit: usize,
        offset: usize,
    ) -> Result<OrderList, HubError> {
        self.enter("search")?;
        let found = self
            .orders()
            .into_iter()
            .filter(|o| matches_query(o, query))
            .collect();
        Ok(Self::page(found, limit, offset))
    }
}

/// Stored object: content type and bytes
type StoredObject = (String, Vec<u8>);

/// In-memory object store
///
/// Objects written with `put_object` live under `{base}/{key}`. Arbitrary
/// URLs can be scripted with [`InMemoryObjectStore::respond_with`] to
/// reproduce the inconsistent envelopes real deployments return.
#[derive(Clone)]
pub struct InMemoryObjectStore {
    base: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    scripted: Arc<RwLock<HashMap<String, ObjectResponse>>>,
    accepted_key: Arc<RwLock<Option<String>>>,
    fail_puts: Arc<RwLock<bool>>,
    requests: Arc<RwLock<Vec<(String, Option<String>)>>>,
    deleted: Arc<RwLock<Vec<String>>>,
}

impl InMemoryObjectStore {
    /// Create a new object store rooted at `base`
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            objects: Arc::new(RwLock::new(HashMap::new())),
            scripted: Arc::new(RwLock::new(HashMap::new())),
            accepted_key: Arc::new(RwLock::new(None)),
            fail_puts: Arc::new(RwLock::new(false)),
            requests: Arc::new(RwLock::new(Vec::new())),
            deleted: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Answer reads of `url` with a fixed response
    pub fn respond_with(&self, url: impl Into<String>, response: ObjectResponse) {
        if let Ok(mut scripted) = self.scripted.write() {
            scripted.insert(url.into(), response);
        }
    }

    /// Refuse reads of stored objects (403) unless this key is presented
    pub fn require_key(&self, key: impl Into<String>) {
        if let Ok(mut accepted) = self.accepted_key.write() {
            *accepted = Some(key.into());
        }
    }

    /// Make writes fail with a 500
    pub fn set_fail_puts(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_puts.write() {
            *flag = fail;
        }
    }

    /// Stored object by key
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().ok().and_then(|o| o.get(key).cloned())
    }

    /// Every read issued so far: (url, credential)
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Keys deleted so far
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.read().map(|d| d.clone()).unwrap_or_default()
    }

    fn key_of<'a>(&self, reference: &'a str) -> &'a str {
        reference
            .strip_prefix(self.base.as_str())
            .unwrap_or(reference)
            .trim_start_matches('/')
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base, key)
    }

    fn is_own_reference(&self, reference: &str) -> bool {
        if !reference.contains("://") {
            return true;
        }
        reference
            .strip_prefix(self.base.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, HubError> {
        if *self.fail_puts.read().map_err(poisoned)? {
            return Err(NetworkError::status(Service::Objects, 500).into());
        }
        self.objects
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(self.object_url(key))
    }

    async fn get_object(
        &self,
        reference: &str,
        credential: Option<&str>,
    ) -> Result<ObjectResponse, HubError> {
        self.requests
            .write()
            .map_err(poisoned)?
            .push((reference.to_string(), credential.map(str::to_string)));

        if let Some(response) = self.scripted.read().map_err(poisoned)?.get(reference) {
            return Ok(response.clone());
        }

        if let Some(required) = self.accepted_key.read().map_err(poisoned)?.as_deref() {
            if credential != Some(required) {
                return Err(NetworkError::status(Service::Objects, 403).into());
            }
        }

        let key = self.key_of(reference);
        let (content_type, body) = self
            .object(key)
            .ok_or_else(|| HubError::from(NetworkError::status(Service::Objects, 404)))?;
        Ok(ObjectResponse {
            content_type: Some(content_type),
            content_disposition: None,
            body,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), HubError> {
        self.deleted.write().map_err(poisoned)?.push(key.to_string());
        self.objects.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
