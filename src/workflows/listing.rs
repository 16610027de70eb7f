//! Listing and pagination workflow
//!
//! [`ListingState`] is owned by its caller. Every fetch takes a
//! [`FetchTicket`]; answers carrying an older ticket than the newest one
//! issued are dropped, so when page clicks race the last request wins.
//! Server pages use [`ListingWorkflow::load`], one private state per request.

use crate::clients::RecordApi;
use crate::core::{HubError, PAGE_SIZE, Page, PageWindow};
use std::sync::{Arc, Mutex};

/// Banner shown when a listing fetch fails
pub const LIST_ERROR_MESSAGE: &str = "Could not fetch orders.";

/// Identifies one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub offset: usize,
}

/// Pagination state of the Orders tab
#[derive(Debug, Clone)]
pub struct ListingState {
    offset: usize,
    page_size: usize,
    page: Page,
    error: Option<String>,
    loading: bool,
    issued: u64,
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingState {
    pub fn new() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
            page: Page::default(),
            error: None,
            loading: false,
            issued: 0,
        }
    }

    /// Position the state at `offset` before its first fetch
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Offset the next fetch will request
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Last successfully loaded page
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Navigation arithmetic against the last known total
    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.offset, self.page_size, self.page.total)
    }

    /// Advance one page if more records remain
    pub fn next(&mut self) -> bool {
        match self.window().next_offset() {
            Some(offset) => {
                self.offset = offset;
                true
            }
            None => false,
        }
    }

    /// Go back one page, floored at zero
    pub fn prev(&mut self) -> bool {
        let offset = self.window().prev_offset();
        let moved = offset != self.offset;
        self.offset = offset;
        moved
    }

    /// Start a fetch for the current offset
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket {
            seq: self.issued,
            offset: self.offset,
        }
    }

    /// Apply a fetch result, returning false when it was superseded
    ///
    /// A failure keeps the previous rows and sets the error banner.
    pub fn apply(&mut self, ticket: FetchTicket, result: Result<Page, HubError>) -> bool {
        if ticket.seq != self.issued {
            tracing::warn!(
                stale = ticket.seq,
                newest = self.issued,
                "Discarding superseded listing response"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.page = page;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(offset = ticket.offset, error = %e, "Listing fetch failed");
                self.error = Some(LIST_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// `Viewing {start} - {end} of {total}` for the rows on screen
    pub fn banner(&self) -> String {
        self.page.banner()
    }
}

/// Fetches pages of orders from the Record API
#[derive(Clone)]
pub struct ListingWorkflow {
    records: Arc<dyn RecordApi>,
}

impl ListingWorkflow {
    pub fn new(records: Arc<dyn RecordApi>) -> Self {
        Self { records }
    }

    /// Fetch one page at `offset`
    pub async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Page, HubError> {
        let list = self.records.list_orders(limit, offset).await?;
        Ok(Page::from_list(list, offset))
    }

    /// Fetch the page at the state's current offset and apply it
    ///
    /// The lock is released while the request is in flight. Returns false
    /// when a newer refresh started meanwhile and this answer was dropped.
    pub async fn refresh(&self, state: &Mutex<ListingState>) -> Result<bool, HubError> {
        let (ticket, limit) = {
            let mut guard = state.lock().map_err(poisoned)?;
            (guard.begin_fetch(), guard.page_size())
        };

        let result = self.fetch_page(limit, ticket.offset).await;

        let mut guard = state.lock().map_err(poisoned)?;
        Ok(guard.apply(ticket, result))
    }

    /// Load the page at `offset` into a fresh state
    ///
    /// The state belongs to the caller alone, so nothing can supersede the
    /// fetch and the returned state is never left loading. Fetch failures
    /// come back as the state's error banner.
    pub async fn load(&self, offset: usize, page_size: usize) -> Result<ListingState, HubError> {
        let state = Mutex::new(ListingState::with_page_size(page_size).at_offset(offset));
        self.refresh(&state).await?;
        state.into_inner().map_err(poisoned)
    }
}

fn poisoned(e: impl std::fmt::Display) -> HubError {
    HubError::Internal(format!("listing state lock poisoned: {}", e))
}
