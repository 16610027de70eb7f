//! Web front end: three tabs over the workflows
//!
//! - **Orders**: paginated table with download links
//! - **Search**: filtered listing
//! - **Upload**: new order form with file
//!
//! Pages are rendered server side from embedded templates.

pub mod builder;
pub mod pages;
pub mod state;
pub mod templates;

pub use builder::{AppBuilder, MAX_UPLOAD_BYTES, routes};
pub use state::AppState;
pub use templates::Templates;
