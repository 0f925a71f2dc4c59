//! HTML parsing and post extraction
//!
//! This module turns rendered feed markup into [`Post`](crate::models::Post)
//! records.

pub mod html;
pub mod sanitize;
pub mod selectors;

// Re-export main extractor and public types
pub use html::{PostExtractor, DEFAULT_AUTHOR, DEFAULT_MAX_POSTS};
pub use selectors::{PostSelectors, POST_CONTAINER};
