//! Raw entry to [`Article`] conversion.

use super::dates::{is_within_24_hours, resolve_date};
use super::images::ImageResolver;
use super::text::normalize_text;
use crate::config::FeedSource;
use crate::models::{Article, RawEntry};
use crate::utils::{article_id, truncate_chars};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Summaries are cut to this many characters after markup is stripped.
pub const SUMMARY_MAX_CHARS: usize = 300;

/// Title used when an entry has none.
pub const UNTITLED: &str = "Untitled";

/// Why an entry was dropped instead of becoming an article.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntrySkip {
    #[error("entry has no link")]
    MissingLink,
}

/// Build the canonical article for one raw entry.
///
/// `run_time` is the instant captured once at the start of the run. It is the
/// fallback publication time and the reference point for `is_new`.
///
/// Apart from the image resolver's optional page fetch this has no side
/// effects. An entry without a link cannot be keyed and is skipped.
pub async fn normalize_entry(
    raw: &RawEntry,
    source: &FeedSource,
    images: &ImageResolver,
    run_time: DateTime<Utc>,
) -> Result<Article, EntrySkip> {
    let url = raw.link().ok_or(EntrySkip::MissingLink)?.to_string();

    let title = match normalize_text(raw.title()) {
        title if title.is_empty() => UNTITLED.to_string(),
        title => title,
    };
    let summary = truncate_chars(&normalize_text(raw.summary_text()), SUMMARY_MAX_CHARS);

    let published = resolve_date(raw, run_time);
    let thumbnail = images.resolve(raw, &url, &source.source_id).await;
    debug!(
        %url,
        date_origin = ?published.origin,
        image_origin = ?thumbnail.origin,
        "Normalized entry"
    );

    Ok(Article {
        id: article_id(&url),
        title,
        summary,
        url,
        thumbnail: thumbnail.url,
        source: source.display_name.clone(),
        source_id: source.source_id.clone(),
        source_icon: source.icon.clone(),
        published_at: published.at,
        is_new: is_within_24_hours(published.at, run_time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::models::Enclosure;
    use chrono::{TimeDelta, TimeZone};

    fn source() -> FeedSource {
        FeedSource::new("bens-bites", "Ben's Bites", "https://example.com/feed", "🍪")
    }

    fn offline_images() -> ImageResolver {
        let config = PipelineConfig {
            page_image_sources: Vec::new(),
            ..PipelineConfig::default()
        };
        ImageResolver::new(reqwest::Client::new(), &config)
    }

    fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).unwrap()
    }

    fn entry(link: &str) -> RawEntry {
        RawEntry {
            title: Some("<b>Big</b> &amp; <i>news</i>".to_string()),
            summary: Some("<p>Hello <b>World</b></p>\n\n  AI".to_string()),
            link: Some(link.to_string()),
            published: Some(run_time() - TimeDelta::hours(1)),
            enclosures: vec![Enclosure::new("https://cdn/a.png", "image/png")],
            ..RawEntry::default()
        }
    }

    #[tokio::test]
    async fn test_normalizes_full_entry() {
        let article = normalize_entry(
            &entry("https://example.com/story"),
            &source(),
            &offline_images(),
            run_time(),
        )
        .await
        .unwrap();

        assert_eq!(article.id, article_id("https://example.com/story"));
        assert_eq!(article.title, "Big & news");
        assert_eq!(article.summary, "Hello World AI");
        assert_eq!(article.url, "https://example.com/story");
        assert_eq!(article.thumbnail, "https://cdn/a.png");
        assert_eq!(article.source, "Ben's Bites");
        assert_eq!(article.source_id, "bens-bites");
        assert_eq!(article.source_icon, "🍪");
        assert_eq!(article.published_at, run_time() - TimeDelta::hours(1));
        assert!(article.is_new);
    }

    #[tokio::test]
    async fn test_missing_link_is_skipped() {
        let mut raw = entry("ignored");
        raw.link = None;
        let result = normalize_entry(&raw, &source(), &offline_images(), run_time()).await;
        assert_eq!(result, Err(EntrySkip::MissingLink));
    }

    #[tokio::test]
    async fn test_missing_fields_degrade() {
        let raw = RawEntry {
            link: Some("https://example.com/bare".to_string()),
            ..RawEntry::default()
        };
        let article = normalize_entry(&raw, &source(), &offline_images(), run_time())
            .await
            .unwrap();
        assert_eq!(article.title, UNTITLED);
        assert_eq!(article.summary, "");
        assert_eq!(article.thumbnail, "");
        assert_eq!(article.published_at, run_time());
        assert!(article.is_new);
    }

    #[tokio::test]
    async fn test_markup_only_title_becomes_untitled() {
        let raw = RawEntry {
            title: Some("<img src=\"x.png\"/>".to_string()),
            link: Some("https://example.com/img".to_string()),
            ..RawEntry::default()
        };
        let article = normalize_entry(&raw, &source(), &offline_images(), run_time())
            .await
            .unwrap();
        assert_eq!(article.title, UNTITLED);
    }

    #[tokio::test]
    async fn test_summary_truncated_after_stripping() {
        let body = "word ".repeat(100);
        let raw = RawEntry {
            summary: Some(format!("<div class=\"long-wrapper-class\">{body}</div>")),
            link: Some("https://example.com/long".to_string()),
            ..RawEntry::default()
        };
        let article = normalize_entry(&raw, &source(), &offline_images(), run_time())
            .await
            .unwrap();
        assert_eq!(article.summary.chars().count(), SUMMARY_MAX_CHARS);
        assert!(!article.summary.contains('<'));
        assert!(article.summary.starts_with("word word"));
    }

    #[tokio::test]
    async fn test_old_entry_is_not_new() {
        let mut raw = entry("https://example.com/old");
        raw.published = Some(run_time() - TimeDelta::hours(30));
        let article = normalize_entry(&raw, &source(), &offline_images(), run_time())
            .await
            .unwrap();
        assert!(!article.is_new);
    }

    #[tokio::test]
    async fn test_description_used_when_summary_absent() {
        let raw = RawEntry {
            description: Some("<p>From the body</p>".to_string()),
            link: Some("https://example.com/desc".to_string()),
            ..RawEntry::default()
        };
        let article = normalize_entry(&raw, &source(), &offline_images(), run_time())
            .await
            .unwrap();
        assert_eq!(article.summary, "From the body");
    }
}
