//! Pages, pagination arithmetic and search parameters

use crate::core::order::{Order, OrderList};
use serde::{Deserialize, Serialize};

/// Number of orders shown per page
pub const PAGE_SIZE: usize = 50;

/// One fetched page of orders
///
/// A page is replaced on every fetch and never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Order>,
    pub offset: usize,
    pub total: usize,
}

impl Page {
    pub fn from_list(list: OrderList, offset: usize) -> Self {
        Self {
            items: list.orders,
            offset,
            total: list.total,
        }
    }

    /// One-based index of the first row, 0 when there is nothing to show
    pub fn start(&self) -> usize {
        if self.total == 0 { 0 } else { self.offset + 1 }
    }

    /// One-based index of the last row
    pub fn end(&self) -> usize {
        self.offset + self.items.len()
    }

    /// `Viewing {start} - {end} of {total}`
    pub fn banner(&self) -> String {
        format!(
            "Viewing {} - {} of {}",
            self.start(),
            self.end(),
            self.total
        )
    }
}

/// Navigation arithmetic shared by listing and search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub offset: usize,
    pub page_size: usize,
    pub total: usize,
}

impl PageWindow {
    pub fn new(offset: usize, page_size: usize, total: usize) -> Self {
        Self {
            offset,
            // Ensure page size is at least 1 so navigation always moves
            page_size: page_size.max(1),
            total,
        }
    }

    /// More records remain past this page
    pub fn has_next(&self) -> bool {
        self.offset + self.page_size < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.offset > 0
    }

    /// Offset of the next page, `None` when this is the last one
    pub fn next_offset(&self) -> Option<usize> {
        self.has_next().then(|| self.offset + self.page_size)
    }

    /// Offset of the previous page, floored at zero
    pub fn prev_offset(&self) -> usize {
        self.offset.saturating_sub(self.page_size)
    }
}

/// Search parameters
///
/// Deserialized straight from the Search tab's query string. Blank values
/// count as absent.
///
/// # Example
/// ```text
/// GET /search?q=bridge&order_fy=fy25&offset=50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Free text matched by the Record API against titles and numbers
    pub q: Option<String>,
    pub order_fy: Option<String>,
    pub order_type: Option<String>,
    pub order_number: Option<String>,
    /// Page start
    pub offset: usize,
}

impl SearchQuery {
    /// Trimmed copy with blank fields dropped and the fiscal year uppercased
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Self {
            q: clean(&self.q),
            order_fy: clean(&self.order_fy).map(|s| s.to_uppercase()),
            order_type: clean(&self.order_type),
            order_number: clean(&self.order_number),
            offset: self.offset,
        }
    }

    /// No filter of any kind is set
    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.q.is_none() && n.order_fy.is_none() && n.order_type.is_none() && n.order_number.is_none()
    }

    /// Query-string pairs for the Record API, absent fields omitted
    pub fn filter_pairs(&self) -> Vec<(&'static str, String)> {
        let n = self.normalized();
        [
            ("q", n.q),
            ("order_fy", n.order_fy),
            ("order_type", n.order_type),
            ("order_number", n.order_number),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}
