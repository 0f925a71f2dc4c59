//! postwatch - rendered feed watcher with Discord delivery
//!
//! Periodically renders a client-side social feed in headless Chromium,
//! extracts the posts, and forwards every post not seen before to a Discord
//! channel, oldest first.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Page rendering and the per-cycle pipeline
//! - [`parser`] - HTML parsing and post extraction
//! - [`models`] - Core data structures and types
//! - [`cache`] - Bounded record of dispatched post ids
//! - [`notifications`] - Message building, dispatch and the Discord channel
//! - [`scheduler`] - Fixed-period cycle loop
//! - [`server`] - Health and metrics endpoints
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use postwatch::cache::SeenCache;
//! use postwatch::config::Config;
//! use postwatch::crawler::{BrowserFetcher, BrowserOptions, Pipeline};
//! use postwatch::notifications::{DiscordChannel, DiscordConfig, Dispatcher};
//! use postwatch::parser::PostExtractor;
//! use postwatch::scheduler::Scheduler;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!
//!     let channel = DiscordChannel::new(DiscordConfig::new(config.bot_token()))?;
//!     let pipeline = Pipeline::new(
//!         Arc::new(BrowserFetcher::new(BrowserOptions::from_config(&config))),
//!         PostExtractor::new(config.target.max_posts),
//!         Arc::new(channel),
//!         Dispatcher::new(SeenCache::new(config.watch.cache_capacity), config.source_label()),
//!         config.target.url.clone(),
//!         config.channel_id().to_string(),
//!     );
//!
//!     Scheduler::new(pipeline, config.interval()).run().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod parser;
pub mod scheduler;
pub mod server;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::SeenCache;
    pub use crate::config::Config;
    pub use crate::crawler::{BrowserFetcher, CycleReport, PageFetcher, Pipeline};
    pub use crate::error::{Error, ErrorCategory, PostwatchErrorTrait, Result};
    pub use crate::models::{Media, Post};
    pub use crate::notifications::{Channel, DiscordChannel, Dispatcher};
    pub use crate::parser::PostExtractor;
    pub use crate::scheduler::Scheduler;
}

// Direct re-exports for convenience
pub use models::{Media, Post};
