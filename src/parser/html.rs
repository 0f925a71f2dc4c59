//! Post extraction from rendered feed markup
//!
//! The feed renders one `div.social-post` block per post, newest first.
//! [`PostExtractor`] turns those blocks into [`Post`] records, oldest first,
//! so that dispatching them in order preserves chronology.

use scraper::{ElementRef, Html};
use url::Url;

use crate::metrics;
use crate::models::{Media, Post, NO_TEXT_CONTENT, TIMESTAMP_UNAVAILABLE};
use crate::parser::sanitize::{has_content, join_text_nodes, sanitize_text};
use crate::parser::selectors::PostSelectors;
use crate::utils::error::ExtractError;
use crate::utils::resolve_url;

/// Default number of containers processed per page
pub const DEFAULT_MAX_POSTS: usize = 30;

/// Author name used when a container has none
pub const DEFAULT_AUTHOR: &str = "Donald J. Trump";

/// Extracts [`Post`] records from rendered markup
///
/// Field extraction is best-effort: a missing optional field falls back to
/// its default, a missing post link drops only that container.
#[derive(Debug, Clone)]
pub struct PostExtractor {
    /// Maximum containers processed per page
    max_posts: usize,

    /// Author name used when the container has none
    default_author: String,

    /// Page URL used to resolve relative links
    base_url: Option<Url>,
}

impl PostExtractor {
    #[must_use]
    pub fn new(max_posts: usize) -> Self {
        Self {
            max_posts,
            default_author: DEFAULT_AUTHOR.to_string(),
            base_url: None,
        }
    }

    /// Set the fallback author name
    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    /// Resolve relative links against this page URL
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Maximum containers processed per page
    #[must_use]
    pub fn max_posts(&self) -> usize {
        self.max_posts
    }

    /// Extract posts from a rendered document, oldest first
    ///
    /// Only the first `max_posts` containers in document order are
    /// considered. Containers that fail to extract are logged and skipped.
    pub fn extract(&self, markup: &str) -> Vec<Post> {
        let document = Html::parse_document(markup);
        let selectors = PostSelectors::new();

        let containers: Vec<ElementRef<'_>> = document
            .select(selectors.container)
            .take(self.max_posts)
            .collect();

        tracing::debug!(
            containers = containers.len(),
            max_posts = self.max_posts,
            "Found post containers"
        );

        let mut posts = Vec::with_capacity(containers.len());
        for (index, container) in containers.into_iter().enumerate() {
            match self.extract_post(&selectors, container) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    metrics::record_extract_error();
                    tracing::warn!(index, error = %e, "Skipping malformed post container");
                }
            }
        }

        // Document order is newest first
        posts.reverse();
        posts
    }

    /// Extract a single post container
    fn extract_post(
        &self,
        selectors: &PostSelectors,
        container: ElementRef<'_>,
    ) -> Result<Post, ExtractError> {
        let href = container
            .select(selectors.link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .filter(|href| has_content(href))
            .ok_or(ExtractError::MissingId)?;

        let id = self
            .resolve(href.trim())
            .ok_or_else(|| ExtractError::InvalidUrl(href.to_string()))?;

        let text = first_text(container, selectors.content, "\n")
            .unwrap_or_else(|| NO_TEXT_CONTENT.to_string());

        let timestamp = first_text(container, selectors.date, " ")
            .unwrap_or_else(|| TIMESTAMP_UNAVAILABLE.to_string());

        let author_name = first_text(container, selectors.username, " ")
            .unwrap_or_else(|| self.default_author.clone());

        let author_avatar_url = container
            .select(selectors.avatar)
            .next()
            .and_then(|img| self.attr_url(img, "src"));

        let media = self.extract_media(selectors, container);

        Ok(Post {
            id,
            text,
            timestamp,
            author_name,
            author_avatar_url,
            media,
        })
    }

    /// Extract media from the container's media block
    ///
    /// An image wins over a video source when both are present.
    fn extract_media(&self, selectors: &PostSelectors, container: ElementRef<'_>) -> Media {
        let Some(block) = container.select(selectors.media).next() else {
            return Media::None;
        };

        if let Some(url) = block
            .select(selectors.media_image)
            .next()
            .and_then(|img| self.attr_url(img, "src"))
        {
            return Media::Image(url);
        }

        if let Some(url) = block
            .select(selectors.media_video_source)
            .next()
            .and_then(|source| self.attr_url(source, "src"))
        {
            return Media::Video(url);
        }

        Media::None
    }

    /// Read a URL attribute and resolve it, dropping empty or invalid values
    fn attr_url(&self, element: ElementRef<'_>, attr: &str) -> Option<String> {
        let value = element.value().attr(attr)?.trim();
        if value.is_empty() {
            return None;
        }

        let resolved = self.resolve(value);
        if resolved.is_none() {
            tracing::debug!(attr, value, "Dropping unresolvable link");
        }
        resolved
    }

    fn resolve(&self, link: &str) -> Option<String> {
        resolve_url(self.base_url.as_ref(), link).ok()
    }
}

impl Default for PostExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POSTS)
    }
}

/// Sanitized text of the first element matching `selector`, if non-empty
fn first_text(
    container: ElementRef<'_>,
    selector: &scraper::Selector,
    separator: &str,
) -> Option<String> {
    let element = container.select(selector).next()?;
    let text = sanitize_text(&join_text_nodes(element.text(), separator));
    has_content(&text).then_some(text)
}
