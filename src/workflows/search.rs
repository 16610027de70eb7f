//! Search workflow: filtered, paginated listing

use crate::clients::RecordApi;
use crate::core::validation::{self, Field};
use crate::core::{HubError, PAGE_SIZE, Page, SearchQuery, ValidationReport};
use std::sync::Arc;

/// Check the filters that are present
///
/// Absent filters are not judged. A query with no filter at all is flagged
/// on the free-text field.
pub fn validate_query(query: &SearchQuery) -> ValidationReport {
    let q = query.normalized();
    let mut report = ValidationReport::new();

    if query.is_empty() {
        report.record(Field::Query, false);
        return report;
    }
    if let Some(fy) = q.order_fy.as_deref() {
        report.record(Field::FiscalYear, validation::is_valid_fiscal_year(fy));
    }
    if let Some(order_type) = q.order_type.as_deref() {
        report.record(Field::OrderType, validation::is_valid_order_type(order_type));
    }
    if let Some(number) = q.order_number.as_deref() {
        report.record(Field::OrderNumber, validation::is_valid_order_number(number));
    }
    report
}

/// Runs searches against the Record API
#[derive(Clone)]
pub struct SearchWorkflow {
    records: Arc<dyn RecordApi>,
    page_size: usize,
}

impl SearchWorkflow {
    pub fn new(records: Arc<dyn RecordApi>) -> Self {
        Self {
            records,
            page_size: PAGE_SIZE,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch the page of matches starting at `query.offset`
    ///
    /// Invalid filters fail with `ValidationRejected` and no request.
    pub async fn search(&self, query: &SearchQuery) -> Result<Page, HubError> {
        validate_query(query).into_result()?;

        let normalized = query.normalized();
        tracing::debug!(filters = ?normalized.filter_pairs(), offset = query.offset, "Searching orders");

        let list = self
            .records
            .search_orders(&normalized, self.page_size, query.offset)
            .await?;
        Ok(Page::from_list(list, query.offset))
    }
}
