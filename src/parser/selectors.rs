//! CSS selectors for the social feed page
//!
//! One named selector per field of a post container. Selectors are compiled
//! once and shared by every extractor instance.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors, panicking on a malformed literal
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// Selector string for a post container, also used by the fetcher's wait
pub const POST_CONTAINER: &str = "div.social-post";

lazy_static! {
    static ref CONTAINER: Selector = parse_selector!("div.social-post");
    static ref LINK: Selector = parse_selector!("a.post-link");
    static ref CONTENT: Selector = parse_selector!("div.post-content");
    static ref DATE: Selector = parse_selector!("div.post-date-bottom");
    static ref USERNAME: Selector = parse_selector!("div.post-username");
    static ref AVATAR: Selector = parse_selector!("img.post-avatar");
    static ref MEDIA: Selector = parse_selector!("div.post-media");
    static ref MEDIA_IMAGE: Selector = parse_selector!("img");
    static ref MEDIA_VIDEO_SOURCE: Selector = parse_selector!("source");
}

/// Selectors for the fields of a post container
pub struct PostSelectors {
    pub container: &'static Selector,
    pub link: &'static Selector,
    pub content: &'static Selector,
    pub date: &'static Selector,
    pub username: &'static Selector,
    pub avatar: &'static Selector,
    pub media: &'static Selector,
    pub media_image: &'static Selector,
    pub media_video_source: &'static Selector,
}

impl PostSelectors {
    #[must_use]
    pub fn new() -> Self {
        Self {
            container: &*CONTAINER,
            link: &*LINK,
            content: &*CONTENT,
            date: &*DATE,
            username: &*USERNAME,
            avatar: &*AVATAR,
            media: &*MEDIA,
            media_image: &*MEDIA_IMAGE,
            media_video_source: &*MEDIA_VIDEO_SOURCE,
        }
    }
}

impl Default for PostSelectors {
    fn default() -> Self {
        Self::new()
    }
}
