//! Data models for raw feed entries and the canonical article record.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RawEntry`]: One feed item as parsed, before normalization
//! - [`Enclosure`]: A typed media reference attached to a raw entry
//! - [`Article`]: The canonical, normalized record that is persisted
//! - [`Snapshot`]: The local JSON artifact written after each run
//!
//! `Article` and `Snapshot` serialize with camelCase keys, which is the shape
//! of the local artifact. The storage layer has its own snake_case row type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A media reference attached to a feed entry (RSS `<enclosure>`, Atom
/// `rel="enclosure"` link, JSON Feed attachment).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enclosure {
    /// Where the media lives.
    pub url: String,
    /// The declared MIME type, empty when the feed did not declare one.
    pub media_type: String,
}

impl Enclosure {
    pub fn new(url: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            media_type: media_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.trim().to_ascii_lowercase().starts_with("image")
    }
}

/// A feed entry as parsed, before normalization.
///
/// Feeds disagree about which fields they carry, so every field is optional
/// and the accessors below are total: an absent field reads as empty rather
/// than failing. Only `link` is required for an entry to become an
/// [`Article`], and that check happens in the entry normalizer.
///
/// # Timestamps
///
/// `published` and `updated` hold timestamps the feed parser already
/// understood. `published_text` holds a date the parser handed over as a
/// plain string (JSON Feed, for instance) and is parsed later against a
/// fixed list of formats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub published_text: Option<String>,
    pub enclosures: Vec<Enclosure>,
    pub media_content: Vec<String>,
    pub media_thumbnails: Vec<String>,
}

impl RawEntry {
    /// The raw title, or an empty string.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// The summary if the feed gave a non-blank one, else the description,
    /// else an empty string.
    pub fn summary_text(&self) -> &str {
        non_blank(self.summary.as_deref())
            .or_else(|| non_blank(self.description.as_deref()))
            .unwrap_or_default()
    }

    /// The trimmed link, or `None` when the entry has no usable link.
    pub fn link(&self) -> Option<&str> {
        non_blank(self.link.as_deref()).map(str::trim)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// The canonical article record.
///
/// Constructed fresh on every run from the current state of its feed and
/// never mutated afterwards. `id` is derived from `url` alone, so the same
/// link always maps to the same row in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// 12 lowercase hex characters hashed from `url`.
    pub id: String,
    /// Markup-free, whitespace-collapsed, never empty.
    pub title: String,
    /// Markup-free, whitespace-collapsed, at most 300 characters.
    pub summary: String,
    /// Canonical article link; the deduplication key.
    pub url: String,
    /// Best-effort image URL, possibly empty.
    pub thumbnail: String,
    /// Human-readable source name.
    pub source: String,
    /// Key of the configured feed source.
    pub source_id: String,
    /// Glyph shown next to the source name.
    pub source_icon: String,
    pub published_at: DateTime<Utc>,
    /// Published within 24 hours of the run that built this record.
    pub is_new: bool,
}

/// The local JSON artifact written after each run.
///
/// This is a debugging/backup copy; the pipeline never reads it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub total_articles: usize,
    pub new_articles: usize,
    /// Ids of the sources that were enabled for this run.
    pub sources: Vec<String>,
    pub articles: Vec<Article>,
}

impl Snapshot {
    pub fn new(fetched_at: DateTime<Utc>, sources: Vec<String>, articles: Vec<Article>) -> Self {
        let new_articles = articles.iter().filter(|article| article.is_new).count();
        Self {
            fetched_at,
            total_articles: articles.len(),
            new_articles,
            sources,
            articles,
        }
    }
}
