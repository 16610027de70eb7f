//! Page handlers for the Orders, Search and Upload tabs
//!
//! Handlers only translate between HTTP and the workflows: no business rule
//! lives here. Workflow failures become an alert on the page, never a crash.

use super::state::AppState;
use crate::core::validation::{ORDER_TYPE_PLACEHOLDER, ORDER_TYPES};
use crate::core::{HubError, Order, Page, PageWindow, Rejection, SearchQuery, ValidationReport};
use crate::workflows::{DownloadedFile, ListingState, UploadFile, UploadForm};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use tera::Context;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Order and file uploaded successfully!";
pub const UPLOAD_FAILURE_MESSAGE: &str = "Failed to upload. Please try again or contact support.";
pub const SEARCH_FAILURE_MESSAGE: &str = "Could not search orders.";

/// Table row: the order plus its display date
#[derive(Serialize)]
struct OrderRow<'a> {
    #[serde(flatten)]
    order: &'a Order,
    date: String,
}

fn rows(page: &Page) -> Vec<OrderRow<'_>> {
    page.items
        .iter()
        .map(|order| OrderRow {
            order,
            date: order.display_date(),
        })
        .collect()
}

fn orders_context(listing: &ListingState, alert: Option<&str>) -> Context {
    let window = listing.window();
    let mut context = Context::new();
    context.insert("tab", "orders");
    context.insert("banner", &listing.banner());
    context.insert("error", &listing.error());
    context.insert("alert", &alert);
    context.insert("loading", &listing.is_loading());
    context.insert("rows", &rows(listing.page()));
    context.insert("has_prev", &window.has_prev());
    context.insert("has_next", &window.has_next());
    context.insert("prev_offset", &window.prev_offset());
    context.insert("next_offset", &window.next_offset().unwrap_or(listing.offset()));
    context.insert("listing_offset", &listing.offset());
    context
}

pub async fn index() -> Redirect {
    Redirect::to("/orders")
}

pub async fn health() -> &'static str {
    "ok"
}

// =============================================================================
// Orders tab
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OrdersParams {
    #[serde(default)]
    pub offset: usize,
}

/// Orders tab at the requested offset
pub async fn orders_page(
    State(state): State<AppState>,
    Query(params): Query<OrdersParams>,
) -> Result<Html<String>, HubError> {
    let listing = state.listing.load(params.offset, state.page_size).await?;
    let html = state
        .templates
        .render("orders.html", &orders_context(&listing, None))?;
    Ok(Html(html))
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub url: String,

    /// Orders page to show again if the download fails
    #[serde(default)]
    pub offset: usize,
}

/// Resolve a stored object and hand it to the browser as an attachment
pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, HubError> {
    match state.download.download(&params.url).await {
        Ok(file) => Ok(attachment(file)),
        Err(e) => {
            tracing::warn!(reference = %params.url, error = %e, "Download failed");
            let listing = state.listing.load(params.offset, state.page_size).await?;
            let html = state.templates.render(
                "orders.html",
                &orders_context(&listing, Some(e.user_message())),
            )?;
            Ok((e.status_code(), Html(html)).into_response())
        }
    }
}

/// The response owns the bytes and frees them once sent
fn attachment(file: DownloadedFile) -> Response {
    let disposition = file.attachment_disposition();
    (
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

// =============================================================================
// Search tab
// =============================================================================

/// Search form values as typed, blanks for absent filters
#[derive(Debug, Default, Serialize)]
struct SearchView {
    q: String,
    order_fy: String,
    order_type: String,
    order_number: String,
}

impl From<&SearchQuery> for SearchView {
    fn from(query: &SearchQuery) -> Self {
        let n = query.normalized();
        Self {
            q: n.q.unwrap_or_default(),
            order_fy: n.order_fy.unwrap_or_default(),
            order_type: n.order_type.unwrap_or_default(),
            order_number: n.order_number.unwrap_or_default(),
        }
    }
}

pub async fn search_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, HubError> {
    let mut context = Context::new();
    context.insert("tab", "search");
    context.insert("order_types", &ORDER_TYPES);
    context.insert("query", &SearchView::from(&query));

    // First visit: just the form
    if query.is_empty() {
        context.insert("invalid", &ValidationReport::new());
        let html = state.templates.render("search.html", &context)?;
        return Ok(Html(html).into_response());
    }

    let status = match state.search.search(&query).await {
        Ok(page) => {
            let window = PageWindow::new(page.offset, state.search.page_size(), page.total);
            context.insert("invalid", &ValidationReport::new());
            context.insert("banner", &page.banner());
            context.insert("rows", &rows(&page));
            context.insert("has_prev", &window.has_prev());
            context.insert("has_next", &window.has_next());
            context.insert("prev_offset", &window.prev_offset());
            context.insert("next_offset", &window.next_offset().unwrap_or(page.offset));
            StatusCode::OK
        }
        Err(HubError::ValidationRejected(Rejection::Fields(report))) => {
            context.insert("invalid", &report);
            context.insert("error", "Please correct all highlighted fields.");
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            tracing::warn!(error = %e, "Search failed");
            context.insert("invalid", &ValidationReport::new());
            context.insert("error", SEARCH_FAILURE_MESSAGE);
            e.status_code()
        }
    };

    let html = state.templates.render("search.html", &context)?;
    Ok((status, Html(html)).into_response())
}

// =============================================================================
// Upload tab
// =============================================================================

fn upload_context(
    form: &UploadForm,
    invalid: &ValidationReport,
    error: Option<&str>,
    success: Option<&str>,
) -> Context {
    let mut context = Context::new();
    context.insert("tab", "upload");
    context.insert("form", form);
    context.insert("invalid", invalid);
    context.insert("order_types", &ORDER_TYPES);
    context.insert("placeholder", ORDER_TYPE_PLACEHOLDER);
    context.insert("error", &error);
    context.insert("success", &success);
    context
}

pub async fn upload_form(State(state): State<AppState>) -> Result<Html<String>, HubError> {
    let context = upload_context(
        &UploadForm::default(),
        &ValidationReport::new(),
        None,
        None,
    );
    Ok(Html(state.templates.render("upload.html", &context)?))
}

pub async fn upload_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, HubError> {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable upload form");
            let context = upload_context(
                &UploadForm::default(),
                &ValidationReport::new(),
                Some(UPLOAD_FAILURE_MESSAGE),
                None,
            );
            let html = state.templates.render("upload.html", &context)?;
            return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
        }
    };

    match state.upload.upload(&form).await {
        Ok(_) => {
            let context = upload_context(
                &UploadForm::default(),
                &ValidationReport::new(),
                None,
                Some(UPLOAD_SUCCESS_MESSAGE),
            );
            Ok(Html(state.templates.render("upload.html", &context)?).into_response())
        }
        Err(e) => {
            let (invalid, message) = match &e {
                HubError::ValidationRejected(Rejection::Fields(report)) => {
                    (report.clone(), e.user_message())
                }
                _ => {
                    tracing::warn!(error = %e, "Upload failed");
                    (ValidationReport::new(), UPLOAD_FAILURE_MESSAGE)
                }
            };
            // Entered values stay in the form for a retry
            let context = upload_context(&form, &invalid, Some(message), None);
            let html = state.templates.render("upload.html", &context)?;
            Ok((e.status_code(), Html(html)).into_response())
        }
    }
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            if !file_name.is_empty() {
                form.file = Some(UploadFile {
                    name: file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "order_fy" => form.order_fy = value,
            "order_type" => form.order_type = value,
            "order_number" => form.order_number = value,
            "order_date" => form.order_date = value,
            "order_title" => form.order_title = value,
            _ => {}
        }
    }

    Ok(form)
}
