use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::parser::{FeedParseError, parse_feed_bytes};
use crate::config::{FeedSource, PipelineConfig};
use crate::models::Article;
use crate::normalize::entry::normalize_entry;
use crate::normalize::images::ImageResolver;

/// Entries of one feed normalized at the same time. Only matters for sources
/// with the page image fallback, where normalizing makes a request.
const ENTRY_CONCURRENCY: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
    #[error("feed could not be parsed: {0}")]
    Parse(#[from] FeedParseError),
}

/// What one source produced in one run.
///
/// A failed source carries no articles and the error that stopped it.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source_id: String,
    pub articles: Vec<Article>,
    /// Entries dropped because they could not be normalized.
    pub skipped: usize,
    pub error: Option<FetchError>,
}

impl SourceOutcome {
    fn failed(source: &FeedSource, error: FetchError) -> Self {
        Self {
            source_id: source.source_id.clone(),
            articles: Vec::new(),
            skipped: 0,
            error: Some(error),
        }
    }
}

/// GET a feed body, bounded by `timeout`.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).timeout(timeout).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }
    Ok(response.bytes().await?.to_vec())
}

/// Fetches feeds and turns their entries into articles.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    images: ImageResolver,
    feed_timeout: Duration,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, config: &PipelineConfig) -> Self {
        Self {
            images: ImageResolver::new(client.clone(), config),
            client,
            feed_timeout: config.feed_timeout(),
        }
    }

    /// Fetch, parse and normalize one source.
    ///
    /// Never fails: transport and parse errors end up in
    /// [`SourceOutcome::error`] so the caller can carry on with other sources.
    /// Entries without a link are counted in [`SourceOutcome::skipped`].
    #[instrument(level = "info", skip_all, fields(source_id = %source.source_id))]
    pub async fn fetch_source(&self, source: &FeedSource, run_time: DateTime<Utc>) -> SourceOutcome {
        info!(name = %source.display_name, url = %source.feed_url, "Fetching feed");
        let entries = match fetch_feed(&self.client, &source.feed_url, self.feed_timeout)
            .await
            .and_then(|body| parse_feed_bytes(&body).map_err(FetchError::from))
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(name = %source.display_name, error = %e, "Feed fetch failed");
                return SourceOutcome::failed(source, e);
            }
        };

        let results: Vec<_> = stream::iter(entries.iter())
            .map(|entry| normalize_entry(entry, source, &self.images, run_time))
            .buffered(ENTRY_CONCURRENCY)
            .collect()
            .await;

        let mut articles = Vec::with_capacity(results.len());
        let mut skipped = 0;
        for result in results {
            match result {
                Ok(article) => articles.push(article),
                Err(reason) => {
                    skipped += 1;
                    debug!(%reason, "Skipped entry");
                }
            }
        }

        info!(
            name = %source.display_name,
            count = articles.len(),
            skipped,
            "Fetched feed articles"
        );
        SourceOutcome {
            source_id: source.source_id.clone(),
            articles,
            skipped,
            error: None,
        }
    }
}
