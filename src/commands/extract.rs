use anyhow::{Context, Result};
use std::path::PathBuf;

use postwatch::config::Config;
use postwatch::crawler::{BrowserFetcher, BrowserOptions, PageFetcher};

use super::build_extractor;

/// Print extracted posts, oldest first, as JSON
///
/// Reads a saved page when `file` is given, otherwise renders the target.
pub async fn extract(config: Config, file: Option<PathBuf>, base_url: Option<String>) -> Result<()> {
    config.validate_limits().context("Invalid configuration")?;

    let mut extractor = build_extractor(&config)?;

    let markup = match file {
        Some(path) => {
            if let Some(base) = base_url {
                let base = url::Url::parse(&base).with_context(|| format!("Invalid base URL: {base}"))?;
                extractor = extractor.with_base_url(base);
            }
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => {
            BrowserFetcher::new(BrowserOptions::from_config(&config))
                .fetch(&config.target.url)
                .await
                .with_context(|| format!("Failed to render {}", config.target.url))?
        }
    };

    let posts = tokio::task::spawn_blocking(move || extractor.extract(&markup))
        .await
        .context("Extraction task failed")?;

    tracing::info!(count = posts.len(), "Extracted posts");
    println!("{}", serde_json::to_string_pretty(&posts)?);
    Ok(())
}
