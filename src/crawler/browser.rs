//! Headless Chromium page renderer
//!
//! Each call launches a fresh browser, intercepts every request so that
//! images, stylesheets, fonts and media are never downloaded, navigates to
//! the page, waits for the first post container and returns the rendered
//! document. The browser is torn down on every path out of [`BrowserFetcher::fetch`].

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::crawler::PageFetcher;
use crate::parser::POST_CONTAINER;
use crate::utils::error::FetchError;

/// Interval between checks for the post container
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser launch and wait settings
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Chromium executable; autodetected when `None`
    pub executable: Option<String>,

    /// Launch with `--no-sandbox`
    pub no_sandbox: bool,

    /// Bound on the initial navigation
    pub navigation_timeout: Duration,

    /// Bound on the wait for the first post container
    pub selector_timeout: Duration,

    /// Selector that marks the page as rendered
    pub ready_selector: String,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            executable: None,
            no_sandbox: false,
            navigation_timeout: Duration::from_secs(60),
            selector_timeout: Duration::from_secs(30),
            ready_selector: POST_CONTAINER.to_string(),
        }
    }
}

impl BrowserOptions {
    /// Build options from the loaded configuration
    #[must_use]
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            executable: config.browser.chrome_path.clone(),
            no_sandbox: config.browser.no_sandbox,
            navigation_timeout: config.navigation_timeout(),
            selector_timeout: config.selector_timeout(),
            ready_selector: POST_CONTAINER.to_string(),
        }
    }

    fn launch_config(&self) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder().request_timeout(self.navigation_timeout);

        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(FetchError::Launch)
    }
}

/// Resource types never downloaded while rendering
fn is_blocked(resource_type: &ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media
    )
}

/// Renders pages with a disposable headless Chromium
#[derive(Debug, Clone, Default)]
pub struct BrowserFetcher {
    options: BrowserOptions,
}

impl BrowserFetcher {
    /// Create a fetcher with the given options
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Navigate, wait for posts and read back the document
    async fn render(&self, page: &Page, url: &str) -> Result<String, FetchError> {
        let nav_secs = self.options.navigation_timeout.as_secs();
        tokio::time::timeout(self.options.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| FetchError::Timeout {
                stage: "navigating",
                secs: nav_secs,
            })?
            .map_err(|e| FetchError::Navigation(e.to_string()))?;

        tracing::debug!(url = %url, "Navigation finished, waiting for posts");

        let selector = self.options.ready_selector.as_str();
        let wait = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.options.selector_timeout, wait)
            .await
            .map_err(|_| FetchError::Timeout {
                stage: "waiting for posts",
                secs: self.options.selector_timeout.as_secs(),
            })?;

        page.content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }

    /// Turn on request interception and spawn the task answering it
    async fn intercept(page: &Page) -> Result<JoinHandle<()>, FetchError> {
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        page.execute(
            EnableParams::builder()
                .pattern(RequestPattern::builder().url_pattern("*").build())
                .build(),
        )
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?;

        let page = page.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let request_id = event.request_id.clone();
                let result = if is_blocked(&event.resource_type) {
                    page.execute(FailRequestParams::new(request_id, ErrorReason::BlockedByClient))
                        .await
                        .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(request_id))
                        .await
                        .map(|_| ())
                };

                if let Err(e) = result {
                    tracing::trace!(url = %event.request.url, error = %e, "Interception reply failed");
                }
            }
        }))
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let config = self.options.launch_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::debug!(url = %url, "Browser launched");

        let mut interceptor = None;
        let result = async {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            interceptor = Some(Self::intercept(&page).await?);
            self.render(&page, url).await
        }
        .await;

        if let Some(task) = interceptor {
            task.abort();
        }
        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "Browser close command failed");
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "Waiting for browser exit failed");
        }
        handler_task.abort();
        let _ = handler_task.await;

        match &result {
            Ok(markup) => tracing::debug!(url = %url, bytes = markup.len(), "Page rendered"),
            Err(e) => tracing::debug!(url = %url, error = %e, "Page render failed"),
        }
        result
    }
}
