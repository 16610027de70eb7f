//! Typed error handling for ORDHub
//!
//! Every failure a workflow can report is a [`HubError`]. The presentation
//! layer never lets one escape as a crash: it maps the error to an HTTP
//! status and a user-facing message.
//!
//! # Error Categories
//!
//! - [`NetworkError`]: transport failures and non-2xx answers from either service
//! - [`Rejection`]: local field validation failures or a server-side 4xx refusal
//! - `UnexpectedFormat` / `EmptyPayload`: download payloads that cannot be saved
//! - `PartialUploadFailure`: the object was written but the record was not
//!
//! # Example
//!
//! ```rust,ignore
//! match workflow.upload(form).await {
//!     Ok(receipt) => println!("stored at {}", receipt.order.order_location),
//!     Err(HubError::ValidationRejected(Rejection::Fields(report))) => {
//!         for field in report.invalid_fields() {
//!             println!("invalid: {}", field);
//!         }
//!     }
//!     Err(e) => eprintln!("{}", e.user_message()),
//! }
//! ```

use crate::core::validation::ValidationReport;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for ORDHub workflows
#[derive(Debug)]
pub enum HubError {
    /// Transport failure or non-2xx response
    Network(NetworkError),

    /// Input refused, either locally or by the Record API
    ValidationRejected(Rejection),

    /// A download payload matched none of the known encodings
    UnexpectedFormat { reason: String },

    /// A raw download response carried no bytes
    EmptyPayload { reference: String },

    /// The object was stored but the order record could not be created
    PartialUploadFailure {
        object_key: String,
        cleaned_up: bool,
        cause: Box<HubError>,
    },

    /// Internal errors (template rendering, poisoned state)
    Internal(String),
}

/// Which external service an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Records,
    Objects,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Records => write!(f, "record API"),
            Service::Objects => write!(f, "object store"),
        }
    }
}

/// Transport-level failure
#[derive(Debug)]
pub struct NetworkError {
    pub service: Service,
    /// HTTP status when the service answered, `None` for transport failures
    pub status: Option<u16>,
    pub message: String,
}

impl NetworkError {
    pub fn transport(service: Service, message: impl Into<String>) -> Self {
        Self {
            service,
            status: None,
            message: message.into(),
        }
    }

    pub fn status(service: Service, status: u16) -> Self {
        Self {
            service,
            status: Some(status),
            message: format!("unexpected status {}", status),
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} request failed: {}", self.service, self.message)
    }
}

impl std::error::Error for NetworkError {}

/// Why input was refused
#[derive(Debug)]
pub enum Rejection {
    /// One or more form fields failed local validation
    Fields(ValidationReport),

    /// The service answered with a 4xx status (duplicate key, bad body, ...)
    Server { service: Service, status: u16 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Fields(report) => {
                let fields: Vec<&str> = report.invalid_fields().map(|f| f.as_str()).collect();
                write!(f, "Invalid fields: {}", fields.join(", "))
            }
            Rejection::Server { service, status } => {
                write!(f, "{} rejected the request with status {}", service, status)
            }
        }
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubError::Network(e) => write!(f, "{}", e),
            HubError::ValidationRejected(r) => write!(f, "Validation rejected: {}", r),
            HubError::UnexpectedFormat { reason } => {
                write!(f, "Unexpected download format: {}", reason)
            }
            HubError::EmptyPayload { reference } => {
                write!(f, "Empty payload returned for {}", reference)
            }
            HubError::PartialUploadFailure {
                object_key,
                cleaned_up,
                cause,
            } => write!(
                f,
                "Object '{}' stored but order record failed ({}); cleanup {}",
                object_key,
                cause,
                if *cleaned_up { "succeeded" } else { "not done" }
            ),
            HubError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for HubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HubError::Network(e) => Some(e),
            HubError::PartialUploadFailure { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl HubError {
    /// Get the HTTP status code the presentation layer answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            HubError::Network(_) => StatusCode::BAD_GATEWAY,
            HubError::ValidationRejected(Rejection::Fields(_)) => StatusCode::BAD_REQUEST,
            HubError::ValidationRejected(Rejection::Server { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            HubError::UnexpectedFormat { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HubError::EmptyPayload { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HubError::PartialUploadFailure { .. } => StatusCode::BAD_GATEWAY,
            HubError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            HubError::Network(_) => "NETWORK_ERROR",
            HubError::ValidationRejected(_) => "VALIDATION_REJECTED",
            HubError::UnexpectedFormat { .. } => "UNEXPECTED_FORMAT",
            HubError::EmptyPayload { .. } => "EMPTY_PAYLOAD",
            HubError::PartialUploadFailure { .. } => "PARTIAL_UPLOAD_FAILURE",
            HubError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short message safe to show to the person using the front end
    ///
    /// Server error bodies are never parsed, so these stay generic.
    pub fn user_message(&self) -> &'static str {
        match self {
            HubError::Network(_) => "The service could not be reached. Please try again.",
            HubError::ValidationRejected(Rejection::Fields(_)) => {
                "Please correct all highlighted fields."
            }
            HubError::ValidationRejected(Rejection::Server { .. }) => {
                "The request was rejected by the server."
            }
            HubError::UnexpectedFormat { .. } => "The file arrived in an unexpected format.",
            HubError::EmptyPayload { .. } => "The stored file is empty.",
            HubError::PartialUploadFailure { .. } => {
                "Failed to upload. Please try again or contact support."
            }
            HubError::Internal(_) => "Something went wrong. Please try again.",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Field-level detail for validation failures and partial uploads
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            HubError::ValidationRejected(Rejection::Fields(report)) => {
                Some(serde_json::json!({ "fields": report }))
            }
            HubError::PartialUploadFailure {
                object_key,
                cleaned_up,
                ..
            } => Some(serde_json::json!({
                "object_key": object_key,
                "cleaned_up": cleaned_up
            })),
            _ => None,
        }
    }

    /// True when the failure happened before any network call
    pub fn is_local(&self) -> bool {
        matches!(self, HubError::ValidationRejected(Rejection::Fields(_)))
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<NetworkError> for HubError {
    fn from(err: NetworkError) -> Self {
        HubError::Network(err)
    }
}

impl From<Rejection> for HubError {
    fn from(rejection: Rejection) -> Self {
        HubError::ValidationRejected(rejection)
    }
}

impl From<ValidationReport> for HubError {
    fn from(report: ValidationReport) -> Self {
        HubError::ValidationRejected(Rejection::Fields(report))
    }
}

impl From<tera::Error> for HubError {
    fn from(err: tera::Error) -> Self {
        HubError::Internal(format!("template rendering failed: {}", err))
    }
}
