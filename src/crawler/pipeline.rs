//! One watch cycle: resolve, render, extract, dispatch
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Channel    │   │   Fetcher    │   │  Extractor   │   │  Dispatcher  │
//! │   resolve    │──▶│ (tokio task) │──▶│  (blocking)  │──▶│  SeenCache   │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Stages run strictly in sequence; each result is awaited before the next
//! stage starts. The render runs on its own task so the scheduler's clock and
//! the health server stay responsive, and parsing runs on the blocking pool.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::crawler::PageFetcher;
use crate::error::{Error, PostwatchErrorTrait, Result};
use crate::metrics;
use crate::models::Post;
use crate::notifications::{BotIdentity, Channel, DispatchReport, Dispatcher};
use crate::parser::PostExtractor;
use crate::utils::error::FetchError;

/// Outcome of one completed cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// Posts extracted from the page
    pub extracted: usize,

    /// Dispatch counters
    pub dispatch: DispatchReport,

    /// Wall time of the cycle
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

/// The watch pipeline and its long-lived state
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<PostExtractor>,
    channel: Arc<dyn Channel>,
    dispatcher: Dispatcher,
    target_url: String,
    channel_id: String,
}

impl Pipeline {
    /// Assemble a pipeline
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: PostExtractor,
        channel: Arc<dyn Channel>,
        dispatcher: Dispatcher,
        target_url: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            channel,
            dispatcher,
            target_url: target_url.into(),
            channel_id: channel_id.into(),
        }
    }

    /// URL rendered each cycle
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Dispatcher and its seen cache
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Block until the notification channel is ready
    pub async fn wait_until_ready(&self) -> Result<BotIdentity> {
        let identity = self.channel.wait_until_ready().await?;
        tracing::info!(
            channel = self.channel.name(),
            bot = %identity.name,
            bot_id = %identity.id,
            "Notification channel ready"
        );
        Ok(identity)
    }

    /// Render the target page and extract its posts, oldest first
    pub async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let fetcher = Arc::clone(&self.fetcher);
        let url = self.target_url.clone();

        tracing::info!(url = %url, "Fetching page");
        let markup = tokio::spawn(async move { fetcher.fetch(&url).await })
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))??;

        let extractor = Arc::clone(&self.extractor);
        let posts = tokio::task::spawn_blocking(move || extractor.extract(&markup)).await?;

        metrics::record_posts_extracted(posts.len());
        tracing::info!(count = posts.len(), "Extracted posts");
        Ok(posts)
    }

    /// Run one cycle
    ///
    /// A channel that does not resolve or a failed render skips the cycle
    /// with an error; per-post failures are absorbed into the report.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let _timer = metrics::start_cycle_timer();
        let started = Instant::now();

        let result = self.cycle(started).await;

        metrics::record_cycle(match &result {
            Ok(_) => "completed",
            Err(e) if e.is_channel_unavailable() => "channel_unavailable",
            Err(Error::Fetch(_)) => "fetch_failed",
            Err(_) => "failed",
        });

        match &result {
            Ok(report) => tracing::info!(
                extracted = report.extracted,
                sent = report.dispatch.sent,
                already_seen = report.dispatch.already_seen,
                failed = report.dispatch.failed,
                quarantined = report.dispatch.quarantined,
                elapsed_ms = report.duration.as_millis() as u64,
                "Cycle complete"
            ),
            Err(e) => tracing::warn!(
                category = %e.category(),
                recoverable = e.is_recoverable(),
                error = %e,
                "Cycle skipped"
            ),
        }

        result
    }

    async fn cycle(&mut self, started: Instant) -> Result<CycleReport> {
        let target = self.channel.resolve_channel(&self.channel_id).await?;
        tracing::debug!(target = %target, "Resolved notification channel");

        let posts = self.fetch_posts().await?;

        let dispatch = self
            .dispatcher
            .dispatch(self.channel.as_ref(), &target, &posts)
            .await;

        Ok(CycleReport {
            extracted: posts.len(),
            dispatch,
            duration: started.elapsed(),
        })
    }
}
