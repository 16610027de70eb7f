//! Upload workflow
//!
//! validate form → derive object key → write object → create order record.
//! The object is always written first so a record never points at a file
//! that does not exist.

use crate::clients::{ObjectStore, RecordApi};
use crate::core::validation::{self, Field};
use crate::core::{DEFAULT_CLASSIFICATION, HubError, NewOrder, ValidationReport};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

/// A file chosen in the upload form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    /// Declared MIME type, may be empty
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Extension after the last dot, as typed by the user
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or_default()
    }

    /// Declared MIME type, or one guessed from the extension
    pub fn effective_content_type(&self) -> String {
        if !self.content_type.trim().is_empty() {
            return self.content_type.clone();
        }
        match self.extension().to_ascii_lowercase().as_str() {
            "pdf" => "application/pdf",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            _ => "application/octet-stream",
        }
        .to_string()
    }
}

/// Values entered in the upload form
///
/// The form is borrowed by the workflow, so on failure the presentation
/// layer still holds every value for a retry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadForm {
    pub order_fy: String,
    pub order_type: String,
    pub order_number: String,
    pub order_date: String,
    pub order_title: String,
    #[serde(skip)]
    pub file: Option<UploadFile>,
}

impl UploadForm {
    /// Check every field, never short-circuiting
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.record(
            Field::FiscalYear,
            validation::is_valid_fiscal_year(&self.order_fy),
        );
        report.record(
            Field::OrderType,
            validation::is_valid_order_type(&self.order_type),
        );
        report.record(
            Field::OrderNumber,
            validation::is_valid_order_number(&self.order_number),
        );
        report.record(
            Field::OrderDate,
            validation::is_valid_order_date(&self.order_date),
        );
        report.record(Field::Title, validation::is_valid_title(&self.order_title));
        report.record(
            Field::File,
            validation::is_valid_file(self.file.as_ref().map(|f| f.name.as_str())),
        );
        report
    }

    /// Canonical object key for this form, `None` without a file
    pub fn object_key(&self) -> Option<String> {
        self.file
            .as_ref()
            .map(|f| object_key(&self.order_type, &self.order_number, f.extension()))
    }
}

/// `{ORDER_TYPE}-{order_number}.{extension}`
///
/// Deterministic: uploading the same type/number twice replaces the stored
/// object.
pub fn object_key(order_type: &str, order_number: &str, extension: &str) -> String {
    format!(
        "{}-{}.{}",
        order_type.to_uppercase(),
        order_number,
        extension
    )
}

/// What a successful upload produced
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub object_key: String,
    pub order: NewOrder,
}

/// Stores the file, then the record that points at it
#[derive(Clone)]
pub struct UploadWorkflow {
    records: Arc<dyn RecordApi>,
    objects: Arc<dyn ObjectStore>,
}

impl UploadWorkflow {
    pub fn new(records: Arc<dyn RecordApi>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { records, objects }
    }

    /// Run the upload
    ///
    /// Invalid forms fail with `ValidationRejected` before any request is
    /// made. When the record cannot be created after the object was stored,
    /// the object is deleted on a best-effort basis and
    /// `PartialUploadFailure` reports whether that worked.
    pub async fn upload(&self, form: &UploadForm) -> Result<UploadReceipt, HubError> {
        let report = form.validate();
        if !report.passed() {
            tracing::debug!(
                invalid = ?report.invalid_fields().collect::<Vec<_>>(),
                "Upload form rejected"
            );
            return Err(report.into());
        }

        let (Some(file), Some(key), Ok(order_date)) = (
            form.file.as_ref(),
            form.object_key(),
            NaiveDate::parse_from_str(&form.order_date, "%Y-%m-%d"),
        ) else {
            return Err(HubError::Internal(
                "validated form is missing its file or date".to_string(),
            ));
        };

        let order_location = self
            .objects
            .put_object(&key, file.bytes.clone(), &file.effective_content_type())
            .await?;

        let order = NewOrder {
            classification: DEFAULT_CLASSIFICATION.to_string(),
            order_fy: form.order_fy.to_uppercase(),
            order_type: form.order_type.to_uppercase(),
            order_number: form.order_number.clone(),
            order_date,
            order_title: validation::normalize_title(&form.order_title),
            order_location,
        };

        if let Err(cause) = self.records.create_order(&order).await {
            tracing::warn!(
                object_key = %key,
                error = %cause,
                "Order record failed after the object was stored"
            );
            let cleaned_up = match self.objects.delete_object(&key).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(
                        object_key = %key,
                        error = %e,
                        "Orphaned object left in storage, needs manual reconciliation"
                    );
                    false
                }
            };
            return Err(HubError::PartialUploadFailure {
                object_key: key,
                cleaned_up,
                cause: Box::new(cause),
            });
        }

        tracing::info!(
            object_key = %key,
            order_location = %order.order_location,
            "Order uploaded"
        );
        Ok(UploadReceipt {
            object_key: key,
            order,
        })
    }
}
