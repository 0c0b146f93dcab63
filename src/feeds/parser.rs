use feed_rs::model::{Entry, Link};
use serde::Deserialize;
use url::Url;

use crate::models::{Enclosure, RawEntry};

#[derive(Debug, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed payload is empty")]
    EmptyPayload,
    #[error("xml feed parse error: {0}")]
    Xml(#[from] feed_rs::parser::ParseFeedError),
    #[error("json feed parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct JsonFeed {
    #[serde(default)]
    items: Vec<JsonFeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonFeedItem {
    title: Option<String>,
    url: Option<String>,
    external_url: Option<String>,
    summary: Option<String>,
    content_html: Option<String>,
    content_text: Option<String>,
    date_published: Option<String>,
    date_modified: Option<String>,
    image: Option<String>,
    banner_image: Option<String>,
    #[serde(default)]
    attachments: Vec<JsonFeedAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonFeedAttachment {
    url: String,
    #[serde(default)]
    mime_type: String,
}

/// Parse an RSS, Atom or JSON Feed payload into raw entries.
///
/// A payload whose first non-whitespace byte is `{` is read as JSON Feed;
/// anything else goes through `feed-rs`.
pub fn parse_feed_bytes(raw: &[u8]) -> Result<Vec<RawEntry>, FeedParseError> {
    let trimmed = raw.trim_ascii_start();
    if trimmed.is_empty() {
        return Err(FeedParseError::EmptyPayload);
    }
    if trimmed[0] == b'{' {
        return parse_json_feed(trimmed);
    }
    parse_xml_feed(trimmed)
}

fn parse_xml_feed(raw: &[u8]) -> Result<Vec<RawEntry>, FeedParseError> {
    let feed = feed_rs::parser::parse(raw)?;
    Ok(feed.entries.iter().map(entry_from_xml).collect())
}

fn parse_json_feed(raw: &[u8]) -> Result<Vec<RawEntry>, FeedParseError> {
    let feed: JsonFeed = serde_json::from_slice(raw)?;
    Ok(feed.items.into_iter().map(entry_from_json).collect())
}

fn entry_from_xml(entry: &Entry) -> RawEntry {
    let mut enclosures: Vec<Enclosure> = entry
        .links
        .iter()
        .filter(|link| is_rel(link, "enclosure"))
        .map(|link| Enclosure::new(link.href.clone(), link.media_type.clone().unwrap_or_default()))
        .collect();
    let mut media_content = Vec::new();
    let mut media_thumbnails = Vec::new();

    for media in &entry.media {
        for content in &media.content {
            let Some(url) = content.url.as_ref().map(|u| u.as_str()) else {
                continue;
            };
            // RSS enclosures arrive here too, typed; only untyped or image
            // content counts as media content.
            match content.content_type.as_ref() {
                Some(mime) => {
                    let enclosure = Enclosure::new(url, mime.to_string());
                    if enclosure.is_image() {
                        media_content.push(url.to_string());
                    }
                    enclosures.push(enclosure);
                }
                None => media_content.push(url.to_string()),
            }
        }
        media_thumbnails.extend(
            media
                .thumbnails
                .iter()
                .map(|thumbnail| thumbnail.image.uri.clone()),
        );
    }

    RawEntry {
        title: entry.title.as_ref().map(|text| text.content.clone()),
        summary: entry.summary.as_ref().map(|text| text.content.clone()),
        description: entry
            .content
            .as_ref()
            .and_then(|content| content.body.clone()),
        link: select_entry_link(&entry.links).or_else(|| permalink_id(&entry.id)),
        published: entry.published,
        updated: entry.updated,
        published_text: None,
        enclosures,
        media_content,
        media_thumbnails,
    }
}

/// Prefer an alternate (or untyped) link, then any non-enclosure link.
fn select_entry_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|link| link.rel.is_none() || is_rel(link, "alternate"))
        .or_else(|| links.iter().find(|link| !is_rel(link, "enclosure")))
        .map(|link| link.href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// An RSS `<guid>` that is itself an http(s) URL stands in for a missing link.
fn permalink_id(id: &str) -> Option<String> {
    Url::parse(id.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|_| id.trim().to_string())
}

fn is_rel(link: &Link, rel: &str) -> bool {
    link.rel
        .as_deref()
        .is_some_and(|value| value.eq_ignore_ascii_case(rel))
}

fn entry_from_json(item: JsonFeedItem) -> RawEntry {
    let enclosures = item
        .attachments
        .into_iter()
        .map(|attachment| Enclosure::new(attachment.url, attachment.mime_type))
        .collect();
    let media_content = item.image.into_iter().collect();
    let media_thumbnails = item.banner_image.into_iter().collect();

    RawEntry {
        title: item.title,
        summary: item.summary,
        description: item.content_html.or(item.content_text),
        link: item.url.or(item.external_url),
        published: None,
        updated: None,
        published_text: item.date_published.or(item.date_modified),
        enclosures,
        media_content,
        media_thumbnails,
    }
}
