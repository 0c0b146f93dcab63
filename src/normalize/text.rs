//! Markup stripping for feed text.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Decode HTML entities, drop anything shaped like a tag, collapse whitespace
/// runs to one space and trim.
///
/// Feed text is rarely well-formed HTML, so tags are removed with a linear
/// pattern scan rather than a parser. Entities are decoded first, which means
/// an escaped tag such as `&lt;b&gt;` is removed as well.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_text("<p>Hello <b>World</b></p>\n\n  AI"), "Hello World AI");
/// ```
pub fn normalize_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let decoded = html_escape::decode_html_entities(raw);
    let stripped = TAG_RE.replace_all(&decoded, "");
    WS_RE.replace_all(&stripped, " ").trim().to_string()
}
