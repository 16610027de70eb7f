//! End-to-end tests of the web front end
//!
//! The router is built with in-memory clients and driven through
//! `axum_test::TestServer`, the way a browser would use the three tabs.

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use ordhub::prelude::*;
use std::collections::VecDeque;
use std::future::IntoFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Test Setup
// =============================================================================

struct Harness {
    server: TestServer,
    records: InMemoryRecordApi,
    objects: InMemoryObjectStore,
}

fn order(i: usize) -> Order {
    Order {
        id: i.to_string(),
        order_fy: "FY25".to_string(),
        order_type: "OPORD".to_string(),
        order_number: format!("25-{:03}", i),
        order_date: "2025-01-15".to_string(),
        order_title: format!("Convoy Plan {}", i),
        classification: "UNCLASSIFIED".to_string(),
        order_location: format!("memory://objects/OPORD-25-{:03}.pdf", i),
    }
}

fn seeded(seed: usize) -> InMemoryRecordApi {
    InMemoryRecordApi::with_orders((0..seed).map(order).collect())
}

fn test_server(records: impl RecordApi + 'static, objects: &InMemoryObjectStore) -> TestServer {
    let app = AppBuilder::new()
        .with_records(records)
        .with_objects(objects.clone())
        .with_storage_key("s3-key")
        .with_fallback_key("db-key")
        .build()
        .expect("Failed to build app");
    TestServer::try_new(app).expect("Failed to create test server")
}

fn harness(seed: usize) -> Harness {
    let records = seeded(seed);
    let objects = InMemoryObjectStore::default();

    Harness {
        server: test_server(records.clone(), &objects),
        records,
        objects,
    }
}

/// Record API whose list calls each wait for the next scripted delay
#[derive(Clone)]
struct DelayedRecords {
    inner: InMemoryRecordApi,
    delays: Arc<Mutex<VecDeque<Duration>>>,
}

impl DelayedRecords {
    fn new(inner: InMemoryRecordApi, delays_ms: &[u64]) -> Self {
        Self {
            inner,
            delays: Arc::new(Mutex::new(
                delays_ms.iter().copied().map(Duration::from_millis).collect(),
            )),
        }
    }
}

#[async_trait]
impl RecordApi for DelayedRecords {
    async fn list_orders(&self, limit: usize, offset: usize) -> Result<OrderList, HubError> {
        let delay = self.delays.lock().unwrap().pop_front().unwrap_or_default();
        tokio::time::sleep(delay).await;
        self.inner.list_orders(limit, offset).await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<(), HubError> {
        self.inner.create_order(order).await
    }

    async fn search_orders(
        &self,
        query: &SearchQuery,
        limit: usize,
        offset: usize,
    ) -> Result<OrderList, HubError> {
        self.inner.search_orders(query, limit, offset).await
    }
}

fn upload_form(order_number: &str, file_name: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("order_fy", "fy25")
        .add_text("order_type", "OPORD")
        .add_text("order_number", order_number)
        .add_text("order_date", "2025-03-14")
        .add_text("order_title", "river crossing")
        .add_part(
            "file",
            Part::bytes(b"%PDF-1.7 upload".as_slice())
                .file_name(file_name)
                .mime_type("application/pdf"),
        )
}

#[tokio::test]
async fn test_health_and_root_redirect() {
    let h = harness(0);

    let response = h.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "ok");

    let response = h.server.get("/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/orders");
}

// =============================================================================
// Orders tab
// =============================================================================

mod orders {
    use super::*;

    #[tokio::test]
    async fn test_first_page_has_banner_and_next_control() {
        let h = harness(120);

        let response = h.server.get("/orders").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Viewing 1 - 50 of 120"));
        assert!(html.contains("Convoy Plan 0"));
        assert!(!html.contains("Convoy Plan 50"));
        assert!(html.contains("Next page"));
        assert!(!html.contains("Previous page"));
    }

    #[tokio::test]
    async fn test_navigation_reaches_last_page() {
        let h = harness(120);

        let html = h.server.get("/orders").await.text();
        assert!(html.contains("href=\"/orders?offset=50\""));

        let html = h
            .server
            .get("/orders")
            .add_query_param("offset", "50")
            .await
            .text();
        assert!(html.contains("Viewing 51 - 100 of 120"));
        assert!(html.contains("href=\"/orders?offset=100\""));
        assert!(html.contains("href=\"/orders?offset=0\""));

        let html = h
            .server
            .get("/orders")
            .add_query_param("offset", "100")
            .await
            .text();
        assert!(html.contains("Viewing 101 - 120 of 120"));
        assert!(!html.contains("Next page"));
        assert!(html.contains("Previous page"));
        assert_eq!(h.records.calls(), vec!["list", "list", "list"]);
    }

    #[tokio::test]
    async fn test_one_visitors_page_does_not_move_anothers() {
        let h = harness(120);

        h.server
            .get("/orders")
            .add_query_param("offset", "100")
            .await
            .assert_status_ok();
        let html = h.server.get("/orders").await.text();

        assert!(html.contains("Viewing 1 - 50 of 120"));
    }

    #[tokio::test]
    async fn test_overlapping_requests_each_render_their_own_page() {
        let objects = InMemoryObjectStore::default();
        // The first fetch to start finishes last
        let records = DelayedRecords::new(seeded(120), &[400, 50]);
        let server = test_server(records, &objects);

        let (first, second) = tokio::join!(
            server.get("/orders").into_future(),
            server
                .get("/orders")
                .add_query_param("offset", "50")
                .into_future(),
        );

        first.assert_status_ok();
        second.assert_status_ok();
        let first = first.text();
        let second = second.text();
        assert!(!first.contains("Loading orders..."));
        assert!(!second.contains("Loading orders..."));
        assert!(first.contains("Viewing 1 - 50 of 120"));
        assert!(first.contains("Convoy Plan 0<"));
        assert!(second.contains("Viewing 51 - 100 of 120"));
        assert!(second.contains("Convoy Plan 50<"));
        assert!(!second.contains("Convoy Plan 0<"));
    }

    #[tokio::test]
    async fn test_failed_fetch_shows_error_banner() {
        let h = harness(3);
        h.records.set_failure(Some(500));

        let response = h.server.get("/orders").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Could not fetch orders."));
        assert!(!html.contains("Loading orders..."));
        assert!(html.contains("No orders found."));
    }

    #[tokio::test]
    async fn test_bad_offset_is_rejected() {
        let h = harness(3);

        let response = h
            .server
            .get("/orders")
            .add_query_param("offset", "-1")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(h.records.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let h = harness(0);

        let html = h.server.get("/orders").await.text();

        assert!(html.contains("Viewing 0 - 0 of 0"));
        assert!(html.contains("No orders found."));
    }

    #[tokio::test]
    async fn test_rows_link_to_download() {
        let h = harness(1);

        let html = h.server.get("/orders").await.text();

        assert!(html.contains("/orders/download?url=memory%3A%2F%2Fobjects%2FOPORD"));
        assert!(html.contains("pdf&amp;offset=0\""));
    }
}

// =============================================================================
// Downloads
// =============================================================================

mod download {
    use super::*;

    #[tokio::test]
    async fn test_download_is_an_attachment() {
        let h = harness(0);
        h.objects
            .put_object("OPORD-25-001.pdf", b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .unwrap();

        let response = h
            .server
            .get("/orders/download")
            .add_query_param("url", "memory://objects/OPORD-25-001.pdf")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/pdf");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"OPORD-25-001.pdf\""
        );
        assert_eq!(response.as_bytes().to_vec(), b"%PDF-1.7".to_vec());
        assert_eq!(
            h.objects.requests()[0].1.as_deref(),
            Some("s3-key")
        );
    }

    #[tokio::test]
    async fn test_missing_object_renders_alert() {
        let h = harness(2);

        let response = h
            .server
            .get("/orders/download")
            .add_query_param("url", "memory://objects/OPORD-99-999.pdf")
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let html = response.text();
        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("The service could not be reached."));
    }

    #[tokio::test]
    async fn test_failed_download_returns_to_same_page() {
        let h = harness(120);

        let response = h
            .server
            .get("/orders/download")
            .add_query_param("url", "memory://objects/OPORD-99-999.pdf")
            .add_query_param("offset", "50")
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert!(response.text().contains("Viewing 51 - 100 of 120"));
    }

    #[tokio::test]
    async fn test_foreign_url_gets_no_api_key() {
        let h = harness(0);
        h.objects.require_key("db-key");

        let response = h
            .server
            .get("/orders/download")
            .add_query_param("url", "https://elsewhere.example/steal")
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert_eq!(
            h.objects.requests(),
            vec![("https://elsewhere.example/steal".to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_unknown_envelope_is_unprocessable() {
        let h = harness(0);
        h.objects.respond_with(
            "memory://objects/odd.json",
            ObjectResponse {
                content_type: Some("application/json".to_string()),
                content_disposition: None,
                body: br#"{"status": "archived"}"#.to_vec(),
            },
        );

        let response = h
            .server
            .get("/orders/download")
            .add_query_param("url", "memory://objects/odd.json")
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(
            response
                .text()
                .contains("The file arrived in an unexpected format.")
        );
    }
}

// =============================================================================
// Search tab
// =============================================================================

mod search {
    use super::*;

    #[tokio::test]
    async fn test_blank_search_shows_form_only() {
        let h = harness(5);

        let response = h.server.get("/search").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Search Orders"));
        assert!(!html.contains("Viewing"));
        assert!(h.records.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_lists_matches_and_pages() {
        let h = harness(60);

        let response = h
            .server
            .get("/search")
            .add_query_param("order_fy", "fy25")
            .await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Viewing 1 - 50 of 60"));
        assert!(html.contains("offset=50"));
        assert!(html.contains("value=\"FY25\""));

        let html = h
            .server
            .get("/search")
            .add_query_param("order_fy", "FY25")
            .add_query_param("offset", "50")
            .await
            .text();
        assert!(html.contains("Viewing 51 - 60 of 60"));
    }

    #[tokio::test]
    async fn test_invalid_filter_is_highlighted() {
        let h = harness(5);

        let response = h
            .server
            .get("/search")
            .add_query_param("order_number", "25001")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let html = response.text();
        assert!(html.contains("Please correct all highlighted fields."));
        assert!(html.contains("value=\"25001\""));
        assert!(h.records.calls().is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_shows_message() {
        let h = harness(5);
        h.records.set_failure(Some(503));

        let response = h.server.get("/search").add_query_param("q", "convoy").await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert!(response.text().contains("Could not search orders."));
    }
}

// =============================================================================
// Upload tab
// =============================================================================

mod upload {
    use super::*;

    #[tokio::test]
    async fn test_upload_form_renders() {
        let h = harness(0);

        let response = h.server.get("/upload").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Upload New Order"));
        assert!(html.contains("SELECT ONE"));
        assert!(html.contains("enctype=\"multipart/form-data\""));
    }

    #[tokio::test]
    async fn test_successful_upload_resets_form() {
        let h = harness(0);

        let response = h
            .server
            .post("/upload")
            .multipart(upload_form("25-001", "plan.pdf"))
            .await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Order and file uploaded successfully!"));
        assert!(!html.contains("value=\"river crossing\""));

        assert!(h.objects.object("OPORD-25-001.pdf").is_some());
        let stored = h.records.orders();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].order_title, "River Crossing");
        assert_eq!(stored[0].order_location, "memory://objects/OPORD-25-001.pdf");
    }

    #[tokio::test]
    async fn test_invalid_upload_keeps_values() {
        let h = harness(0);

        let response = h
            .server
            .post("/upload")
            .multipart(upload_form("25-1", "plan.txt"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let html = response.text();
        assert!(html.contains("Please correct all highlighted fields."));
        assert!(html.contains("value=\"river crossing\""));
        assert!(html.contains("value=\"25-1\""));
        assert!(html.contains("class=\"invalid\""));
        assert!(h.records.calls().is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_reports_generic_message() {
        let h = harness(0);
        h.records.set_failure(Some(500));

        let response = h
            .server
            .post("/upload")
            .multipart(upload_form("25-002", "plan.pdf"))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert!(
            response
                .text()
                .contains("Failed to upload. Please try again or contact support.")
        );
        assert_eq!(h.objects.deleted(), vec!["OPORD-25-002.pdf".to_string()]);
    }
}
