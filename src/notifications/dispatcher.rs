//! Per-cycle dispatch of new posts
//!
//! The [`Dispatcher`] owns the [`SeenCache`]. For each post of a cycle,
//! oldest first, it skips ids already seen, sends the post's messages in
//! order, and records the id only once every message was accepted. A failed
//! post is left unrecorded so the next cycle retries it.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::cache::SeenCache;
use crate::metrics;
use crate::models::Post;
use crate::notifications::channels::{Channel, ChannelHandle, ChannelResult};
use crate::notifications::OutboundMessage;

/// Number of quarantined ids remembered
const QUARANTINE_CAPACITY: usize = 100;

/// Outcome counters of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Posts fully delivered and recorded
    pub sent: usize,
    /// Posts skipped because they were already dispatched
    pub already_seen: usize,
    /// Posts whose delivery failed this cycle
    pub failed: usize,
    /// Posts skipped because delivery was given up on
    pub quarantined: usize,
    /// Individual messages accepted by the channel
    pub messages: usize,
}

/// Sends new posts to a channel and remembers what was sent
pub struct Dispatcher {
    /// Ids of delivered posts
    seen: SeenCache,

    /// Source label shown in message footers
    source: String,

    /// Give up on a post after this many failed cycles
    max_attempts: Option<u32>,

    /// Consecutive failed attempts per post id
    failures: HashMap<String, u32>,

    /// Ids given up on; kept apart from `seen`
    quarantine: SeenCache,
}

impl Dispatcher {
    /// Create a dispatcher around an existing cache
    pub fn new(seen: SeenCache, source: impl Into<String>) -> Self {
        Self {
            seen,
            source: source.into(),
            max_attempts: None,
            failures: HashMap::new(),
            quarantine: SeenCache::new(QUARANTINE_CAPACITY),
        }
    }

    /// Stop retrying a post after `max_attempts` failed cycles
    ///
    /// `None` (the default) retries forever.
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts.filter(|n| *n > 0);
        self
    }

    /// Ids of delivered posts
    #[must_use]
    pub fn seen(&self) -> &SeenCache {
        &self.seen
    }

    /// Check whether delivery of a post was given up on
    #[must_use]
    pub fn is_quarantined(&self, id: &str) -> bool {
        self.quarantine.contains(id)
    }

    /// Dispatch a cycle's posts, oldest first
    ///
    /// Never fails as a whole: per-post errors are logged and counted.
    pub async fn dispatch(
        &mut self,
        channel: &dyn Channel,
        target: &ChannelHandle,
        posts: &[Post],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for post in posts {
            if self.seen.contains(&post.id) {
                report.already_seen += 1;
                continue;
            }

            if self.quarantine.contains(&post.id) {
                report.quarantined += 1;
                continue;
            }

            tracing::info!(post_id = %post.id, "Found new post");

            match self.deliver(channel, target, post, &mut report).await {
                Ok(()) => {
                    self.failures.remove(&post.id);
                    self.seen.record(post.id.clone());
                    report.sent += 1;
                    metrics::record_post_dispatched();
                }
                Err(e) => {
                    report.failed += 1;
                    metrics::record_delivery_failure();
                    tracing::warn!(
                        post_id = %post.id,
                        channel = channel.name(),
                        error = %e,
                        "Failed to deliver post, will retry next cycle"
                    );
                    self.note_failure(&post.id);
                }
            }
        }

        // Failure counts only matter while the post is still on the page
        let present: HashSet<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        self.failures.retain(|id, _| present.contains(id.as_str()));

        metrics::set_seen_cache_size(self.seen.len());
        report
    }

    /// Send every message of a post, stopping at the first failure
    async fn deliver(
        &self,
        channel: &dyn Channel,
        target: &ChannelHandle,
        post: &Post,
        report: &mut DispatchReport,
    ) -> ChannelResult<()> {
        for message in OutboundMessage::for_post(post, &self.source) {
            let status = channel.send(target, &message).await?;
            report.messages += 1;
            tracing::debug!(post_id = %post.id, kind = message.kind(), %status, "Sent message");
        }
        Ok(())
    }

    fn note_failure(&mut self, id: &str) {
        let Some(max_attempts) = self.max_attempts else {
            return;
        };

        let attempts = self.failures.entry(id.to_string()).or_insert(0);
        *attempts += 1;

        if *attempts >= max_attempts {
            tracing::error!(
                post_id = %id,
                attempts = *attempts,
                "Giving up on post after repeated delivery failures"
            );
            self.failures.remove(id);
            self.quarantine.record(id.to_string());
        }
    }
}
