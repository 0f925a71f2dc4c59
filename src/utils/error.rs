//! Error types for the postwatch pipeline stages
//!
//! This module defines the per-stage error types used by the fetcher and
//! the post extractor.

use thiserror::Error;

/// Errors that can occur while rendering a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// Browser process could not be started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// Navigation to the target URL failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// A bounded wait ran out of time
    #[error("Timed out after {secs}s while {stage}")]
    Timeout { stage: &'static str, secs: u64 },

    /// CDP protocol or page evaluation error
    #[error("Browser error: {0}")]
    Browser(String),

    /// The worker task running the render panicked or was cancelled
    #[error("Render worker failed: {0}")]
    Worker(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Check if the error is a timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors that can occur while extracting a single post container
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Container has no usable post link
    #[error("Post link not found in container")]
    MissingId,

    /// A link in the container could not be resolved
    #[error("Invalid URL in container: {0}")]
    InvalidUrl(String),
}
