//! Cleanup of text pulled out of rendered post markup
//!
//! `scraper` decodes entities already. What is left to strip is the
//! invisible residue of client-side rendering and editor copy-paste.

use regex::Regex;
use std::sync::LazyLock;

static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize a post field for display
///
/// Invisible and control characters are dropped (newlines and tabs survive),
/// inline whitespace collapses to one space, every line is trimmed and
/// paragraph gaps are capped at a single blank line.
///
/// # Examples
///
/// ```
/// use postwatch::parser::sanitize::sanitize_text;
///
/// assert_eq!(sanitize_text(" Rally\u{200B}  tonight \n\n\n\n 8 PM "), "Rally tonight\n\n8 PM");
/// ```
pub fn sanitize_text(text: &str) -> String {
    let visible: String = text.chars().filter(|c| !is_invisible(*c)).collect();
    let spaced = INLINE_SPACE.replace_all(&visible, " ");

    let lines = spaced.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_RUN.replace_all(&lines, "\n\n").trim().to_string()
}

/// Zero-width marks, line/paragraph separators, the BOM and control
/// characters other than newline and tab
fn is_invisible(c: char) -> bool {
    match c {
        '\n' | '\t' => false,
        '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202F}' | '\u{FEFF}' => true,
        c => c.is_control(),
    }
}

/// Join text nodes, trimming each and dropping the empty ones
///
/// # Examples
///
/// ```
/// use postwatch::parser::sanitize::join_text_nodes;
///
/// let nodes = ["  First ", "\n", "Second  "];
/// assert_eq!(join_text_nodes(nodes, "\n"), "First\nSecond");
/// assert_eq!(join_text_nodes(nodes, ""), "FirstSecond");
/// ```
pub fn join_text_nodes<'a>(nodes: impl IntoIterator<Item = &'a str>, separator: &str) -> String {
    nodes
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// True when anything other than whitespace is left
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}
