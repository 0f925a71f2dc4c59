//! Page rendering and the per-cycle watch pipeline
//!
//! [`PageFetcher`] is the seam between the pipeline and the renderer: the
//! production implementation drives headless Chromium, tests plug in canned
//! markup.

pub mod browser;
pub mod pipeline;

use async_trait::async_trait;

use crate::utils::error::FetchError;

pub use browser::{BrowserFetcher, BrowserOptions};
pub use pipeline::{CycleReport, Pipeline};

/// Renders a client-side page and returns its final markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Render `url` and return the document once posts are present
    ///
    /// Every failure, including timeouts, is reported as a [`FetchError`].
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
