//! Extraction tests against a saved rendered feed

mod common;

use common::{load_fixture, page, page_of, post_html, FEED_URL};
use postwatch::models::{Media, NO_TEXT_CONTENT, TIMESTAMP_UNAVAILABLE};
use postwatch::parser::{PostExtractor, DEFAULT_AUTHOR};
use url::Url;

#[test]
fn test_feed_fixture_oldest_first() {
    let html = load_fixture("feed.html");
    let posts = PostExtractor::default().extract(&html);

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "https://social.example.com/@member/101",
            "https://social.example.com/@member/102",
            "https://social.example.com/@member/103",
        ],
        "malformed container skipped, remaining posts reversed"
    );
}

#[test]
fn test_feed_fixture_fields() {
    let html = load_fixture("feed.html");
    let posts = PostExtractor::default().extract(&html);

    let bare = &posts[0];
    assert_eq!(bare.text, NO_TEXT_CONTENT);
    assert_eq!(bare.timestamp, TIMESTAMP_UNAVAILABLE);
    assert_eq!(bare.author_name, DEFAULT_AUTHOR);
    assert_eq!(bare.author_avatar_url, None);
    assert_eq!(bare.media, Media::None);

    let photo = &posts[1];
    assert_eq!(photo.text, "Photo from the rally.\nThank you all!");
    assert_eq!(photo.timestamp, "July 4, 2025, 9:30 AM");
    assert_eq!(photo.author_name, "Feed Member");
    assert_eq!(
        photo.media,
        Media::Image("https://cdn.example.com/images/102.jpg".to_string()),
        "image wins over a video source in the same block"
    );

    let video = &posts[2];
    assert_eq!(
        video.media,
        Media::Video("https://cdn.example.com/clips/103.mp4".to_string())
    );
}

#[test]
fn test_relative_links_resolved_against_base() {
    let html = load_fixture("feed.html");
    let extractor = PostExtractor::default().with_base_url(Url::parse(FEED_URL).unwrap());
    let posts = extractor.extract(&html);

    assert_eq!(
        posts[1].author_avatar_url.as_deref(),
        Some("https://feed.example.com/media/avatars/member.jpg")
    );
}

#[test]
fn test_cap_keeps_newest_containers() {
    let html = load_fixture("feed.html");
    let posts = PostExtractor::new(2).extract(&html);

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "https://social.example.com/@member/102",
            "https://social.example.com/@member/103",
        ]
    );
}

#[test]
fn test_cap_counts_malformed_containers() {
    let html = page(&[
        post_html("https://t.example/3", "three"),
        r#"<div class="social-post"><p>no link</p></div>"#.to_string(),
        post_html("https://t.example/1", "one"),
    ]);

    let posts = PostExtractor::new(2).extract(&html);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "https://t.example/3");
}

#[test]
fn test_same_markup_same_ids() {
    let html = page_of(&["https://t.example/c", "https://t.example/b", "https://t.example/a"]);
    let extractor = PostExtractor::default();

    let first: Vec<String> = extractor.extract(&html).into_iter().map(|p| p.id).collect();
    let second: Vec<String> = extractor.extract(&html).into_iter().map(|p| p.id).collect();

    assert_eq!(first, vec!["https://t.example/a", "https://t.example/b", "https://t.example/c"]);
    assert_eq!(first, second);
}

#[test]
fn test_custom_default_author() {
    let html = page(&[r#"<div class="social-post"><a class="post-link" href="https://t.example/1"></a></div>"#.to_string()]);
    let posts = PostExtractor::default()
        .with_default_author("Someone Else")
        .extract(&html);

    assert_eq!(posts[0].author_name, "Someone Else");
}

#[test]
fn test_page_without_posts() {
    let posts = PostExtractor::default().extract("<html><body><p>Loading…</p></body></html>");
    assert!(posts.is_empty());
}
