pub mod extract;
pub mod run;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use postwatch::cache::SeenCache;
use postwatch::config::Config;
use postwatch::crawler::{BrowserFetcher, BrowserOptions, Pipeline};
use postwatch::notifications::{DiscordChannel, DiscordConfig, Dispatcher};
use postwatch::parser::PostExtractor;

// Re-export command functions for convenience
pub use extract::extract;
pub use run::{once, run};

/// Load the layered configuration
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

/// Extractor configured for the target page
pub fn build_extractor(config: &Config) -> Result<PostExtractor> {
    let base_url = url::Url::parse(&config.target.url)
        .with_context(|| format!("Invalid target URL: {}", config.target.url))?;

    Ok(PostExtractor::new(config.target.max_posts)
        .with_default_author(config.target.default_author.clone())
        .with_base_url(base_url))
}

/// Wire up the production pipeline from configuration
pub fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let channel = DiscordChannel::new(
        DiscordConfig::new(config.bot_token())
            .with_api_base(config.discord.api_base.clone()),
    )
    .context("Failed to create Discord channel")?;

    let dispatcher = Dispatcher::new(
        SeenCache::new(config.watch.cache_capacity),
        config.source_label(),
    )
    .with_max_attempts(config.watch.max_delivery_attempts);

    Ok(Pipeline::new(
        Arc::new(BrowserFetcher::new(BrowserOptions::from_config(config))),
        build_extractor(config)?,
        Arc::new(channel),
        dispatcher,
        config.target.url.clone(),
        config.channel_id().to_string(),
    ))
}
