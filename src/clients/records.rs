//! HTTP client for the Record API

use super::{API_KEY_HEADER, RecordApi, check_status, http_client, transport_error};
use crate::config::ServiceEndpoint;
use crate::core::{HubError, NetworkError, NewOrder, OrderList, SearchQuery, Service};
use async_trait::async_trait;

/// Record API over HTTP
///
/// - `GET {base}?limit=&offset=` lists
/// - `GET {base}?limit=&offset=&q=...` searches
/// - `POST {base}` creates
#[derive(Clone)]
pub struct HttpRecordClient {
    client: reqwest::Client,
    endpoint: ServiceEndpoint,
}

impl HttpRecordClient {
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self, HubError> {
        Ok(Self::with_client(http_client()?, endpoint))
    }

    /// Share an existing connection pool
    pub fn with_client(client: reqwest::Client, endpoint: ServiceEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn fetch_list(&self, query: Vec<(&str, String)>) -> Result<OrderList, HubError> {
        tracing::debug!(base = %self.endpoint.base(), ?query, "Fetching orders");

        let response = self
            .client
            .get(self.endpoint.base())
            .header(API_KEY_HEADER, &self.endpoint.api_key)
            .query(&query)
            .send()
            .await
            .map_err(transport_error(Service::Records))?;
        let response = check_status(Service::Records, response, false)?;

        response.json::<OrderList>().await.map_err(|e| {
            NetworkError::transport(Service::Records, format!("invalid list body: {}", e)).into()
        })
    }
}

#[async_trait]
impl RecordApi for HttpRecordClient {
    async fn list_orders(&self, limit: usize, offset: usize) -> Result<OrderList, HubError> {
        self.fetch_list(vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ])
        .await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<(), HubError> {
        tracing::debug!(
            order_type = %order.order_type,
            order_number = %order.order_number,
            "Creating order record"
        );

        let response = self
            .client
            .post(self.endpoint.base())
            .header(API_KEY_HEADER, &self.endpoint.api_key)
            .json(order)
            .send()
            .await
            .map_err(transport_error(Service::Records))?;
        check_status(Service::Records, response, true)?;
        Ok(())
    }

    async fn search_orders(
        &self,
        query: &SearchQuery,
        limit: usize,
        offset: usize,
    ) -> Result<OrderList, HubError> {
        let mut pairs = vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        pairs.extend(query.filter_pairs());
        self.fetch_list(pairs).await
    }
}
