//! Core module containing the order model, validation and error types

pub mod error;
pub mod order;
pub mod query;
pub mod validation;

pub use error::{HubError, NetworkError, Rejection, Service};
pub use order::{DEFAULT_CLASSIFICATION, NewOrder, Order, OrderList};
pub use query::{PAGE_SIZE, Page, PageWindow, SearchQuery};
pub use validation::{Field, ValidationReport};
