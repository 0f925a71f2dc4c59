//! URL and text helpers shared by the extractor, the message builder and
//! the configuration

pub mod error;

use anyhow::{Context, Result};
use url::Url;

/// Host of a URL without a leading `www.`, used as the footer source label
pub fn extract_domain(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;

    parsed
        .host_str()
        .map(|s| s.trim_start_matches("www.").to_string())
        .context("No host in URL")
}

/// Truncate text to a maximum number of characters
///
/// Counts `char`s rather than bytes so multi-byte text never splits.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Resolve a possibly relative link against a base URL
///
/// Without a base, the link is returned unchanged.
pub fn resolve_url(base: Option<&Url>, link: &str) -> Result<String, url::ParseError> {
    match base {
        Some(base) => base.join(link).map(String::from),
        None => Ok(link.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        let domain = extract_domain("https://civictracker.us/executive/member/?uuid=1");
        assert_eq!(domain.unwrap(), "civictracker.us");

        let www = extract_domain("https://www.example.com/feed");
        assert_eq!(www.unwrap(), "example.com");

        assert!(extract_domain("not a url").is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
    }

    #[test]
    fn test_truncate_text_multibyte() {
        let text = "가나다라마바사아자차";
        assert_eq!(truncate_text(text, 5), "가나...");
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/feed/page").unwrap();
        assert_eq!(
            resolve_url(Some(&base), "/posts/1").unwrap(),
            "https://example.com/posts/1"
        );
        assert_eq!(
            resolve_url(Some(&base), "https://other.org/x").unwrap(),
            "https://other.org/x"
        );
        assert_eq!(resolve_url(None, "/posts/1").unwrap(), "/posts/1");
    }
}
