//! Image URL discovery for feed entries.
//!
//! Strategies are tried in order and the first hit wins:
//!
//! 1. An enclosure whose declared type starts with `image`
//! 2. The first media content URL
//! 3. The first media thumbnail URL
//! 4. For sources listed in `page_image_sources` only: fetch the article
//!    page and scan it for an `og:image`, then a `twitter:image` meta tag
//!
//! The page fetch is best-effort. Transport errors, bad status codes and
//! pages without a matching tag all resolve to an empty thumbnail.

use crate::config::PipelineConfig;
use crate::models::RawEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::USER_AGENT;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

static META_IMAGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)<meta[^>]*property=["']og:image["'][^>]*content=["']([^"']+)["']"#,
        r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*property=["']og:image["']"#,
        r#"(?i)<meta[^>]*name=["']twitter:image["'][^>]*content=["']([^"']+)["']"#,
        r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*name=["']twitter:image["']"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("meta image pattern is valid"))
    .collect()
});

/// Which strategy produced an image URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Enclosure,
    MediaContent,
    MediaThumbnail,
    PageMeta,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Empty when `origin` is [`ImageOrigin::Missing`].
    pub url: String,
    pub origin: ImageOrigin,
}

impl ResolvedImage {
    fn found(url: &str, origin: ImageOrigin) -> Self {
        Self {
            url: url.trim().to_string(),
            origin,
        }
    }

    pub fn missing() -> Self {
        Self {
            url: String::new(),
            origin: ImageOrigin::Missing,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum PageImageError {
    #[error("article url is not http(s): {0}")]
    UnsupportedUrl(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
}

/// Look for an image in the entry itself, without touching the network.
pub fn image_from_entry(entry: &RawEntry) -> Option<ResolvedImage> {
    if let Some(enclosure) = entry
        .enclosures
        .iter()
        .find(|enclosure| enclosure.is_image() && !enclosure.url.trim().is_empty())
    {
        return Some(ResolvedImage::found(&enclosure.url, ImageOrigin::Enclosure));
    }
    if let Some(url) = first_non_blank(&entry.media_content) {
        return Some(ResolvedImage::found(url, ImageOrigin::MediaContent));
    }
    first_non_blank(&entry.media_thumbnails)
        .map(|url| ResolvedImage::found(url, ImageOrigin::MediaThumbnail))
}

fn first_non_blank(urls: &[String]) -> Option<&str> {
    urls.iter()
        .map(String::as_str)
        .find(|url| !url.trim().is_empty())
}

/// Scan raw HTML for an Open Graph image, then a Twitter card image.
///
/// Matching is case-insensitive and accepts single or double quotes. Entities
/// in the attribute value (`&amp;` in query strings) are decoded.
pub fn extract_meta_image(html: &str) -> Option<String> {
    META_IMAGE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| html_escape::decode_html_entities(m.as_str().trim()).into_owned())
            .filter(|url| !url.is_empty())
    })
}

/// Resolves thumbnails, fetching article pages for the sources that allow it.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    client: reqwest::Client,
    page_sources: HashSet<String>,
    page_timeout: Duration,
    user_agent: String,
}

impl ImageResolver {
    pub fn new(client: reqwest::Client, config: &PipelineConfig) -> Self {
        Self {
            client,
            page_sources: config.page_image_sources.iter().cloned().collect(),
            page_timeout: config.page_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Whether articles from `source_id` may trigger a page fetch.
    pub fn uses_page_fallback(&self, source_id: &str) -> bool {
        self.page_sources.contains(source_id)
    }

    /// Find the best image for `entry`.
    ///
    /// Never fails: when every strategy comes up empty the result is
    /// [`ResolvedImage::missing`].
    pub async fn resolve(
        &self,
        entry: &RawEntry,
        article_url: &str,
        source_id: &str,
    ) -> ResolvedImage {
        if let Some(image) = image_from_entry(entry) {
            return image;
        }
        if !self.uses_page_fallback(source_id) || article_url.trim().is_empty() {
            return ResolvedImage::missing();
        }
        match self.fetch_page_image(article_url).await {
            Ok(Some(url)) => ResolvedImage::found(&url, ImageOrigin::PageMeta),
            Ok(None) => {
                debug!(%article_url, "Article page has no image meta tag");
                ResolvedImage::missing()
            }
            Err(e) => {
                debug!(%article_url, error = %e, "Page image lookup failed");
                ResolvedImage::missing()
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(%article_url))]
    async fn fetch_page_image(&self, article_url: &str) -> Result<Option<String>, PageImageError> {
        let url = Url::parse(article_url.trim())
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| PageImageError::UnsupportedUrl(article_url.to_string()))?;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.page_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PageImageError::HttpStatus(status.as_u16()));
        }
        let html = response.text().await?;
        Ok(extract_meta_image(&html))
    }
}
