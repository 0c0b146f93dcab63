//! Fetch every enabled source, aggregate, then upsert once.
//!
//! # Architecture
//!
//! [`Pipeline::run`] goes through three steps:
//!
//! 1. [`Pipeline::collect`]: fan out one fetch per enabled source, wait for
//!    all of them, then aggregate. Source failures are recorded, not raised.
//! 2. Write the local snapshot, when an artifact path is given.
//! 3. [`Pipeline::sync`]: hand the aggregated batch to the store in one call.
//!
//! Fetches complete in any order, but outcomes
//! are buffered in configuration order before aggregation, so the output is
//! the same whichever source answers first.

use crate::aggregate::aggregate;
use crate::config::{FeedSource, PipelineConfig};
use crate::feeds::fetcher::{FetchError, Fetcher, SourceOutcome};
use crate::models::{Article, Snapshot};
use crate::outputs::json::write_snapshot;
use crate::storage::{ArticleStore, SyncError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use tracing::{error, info, instrument, warn};

/// The count reported for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub synced: usize,
}

/// A source that produced nothing this run, and why.
#[derive(Debug)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: FetchError,
}

/// Result of the storage step.
#[derive(Debug)]
pub enum SyncStatus {
    Synced { synced: usize },
    Failed { error: SyncError },
    /// No store was configured.
    Skipped,
}

/// Everything the fetch phase produced.
#[derive(Debug)]
pub struct Collection {
    /// Run time captured once at the start; every article's freshness is
    /// measured against it.
    pub fetched_at: DateTime<Utc>,
    /// Enabled source ids, in configuration order.
    pub sources: Vec<String>,
    /// Deduplicated, newest first.
    pub articles: Vec<Article>,
    pub failures: Vec<SourceFailure>,
    /// Entries dropped across all sources because they had no link.
    pub skipped: usize,
}

impl Collection {
    pub fn new_articles(&self) -> usize {
        self.articles.iter().filter(|article| article.is_new).count()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.fetched_at, self.sources.clone(), self.articles.clone())
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub collection: Collection,
    pub sync: SyncStatus,
}

impl RunReport {
    pub fn summary(&self) -> SyncSummary {
        let synced = match self.sync {
            SyncStatus::Synced { synced } => synced,
            SyncStatus::Failed { .. } | SyncStatus::Skipped => 0,
        };
        SyncSummary { synced }
    }
}

/// The ingestion pipeline, built from an explicit configuration.
#[derive(Debug)]
pub struct Pipeline<S> {
    config: PipelineConfig,
    fetcher: Fetcher,
    store: Option<S>,
}

impl<S: ArticleStore> Pipeline<S> {
    /// `store` is `None` when syncing is disabled; the storage step then
    /// reports [`SyncStatus::Skipped`].
    pub fn new(config: PipelineConfig, client: reqwest::Client, store: Option<S>) -> Self {
        Self {
            fetcher: Fetcher::new(client, &config),
            config,
            store,
        }
    }

    /// Fetch and aggregate, using the current time as the run time.
    pub async fn collect(&self) -> Collection {
        self.collect_at(Utc::now()).await
    }

    /// Fetch and aggregate with an explicit run time.
    #[instrument(level = "info", skip_all, fields(%run_time))]
    pub async fn collect_at(&self, run_time: DateTime<Utc>) -> Collection {
        let sources: Vec<&FeedSource> = self.config.enabled_sources().collect();
        info!(
            sources = sources.len(),
            concurrency = self.config.max_concurrency,
            "Fetching feeds"
        );

        let outcomes: Vec<SourceOutcome> = stream::iter(sources.iter().copied())
            .map(|source| self.fetcher.fetch_source(source, run_time))
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut per_source = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        let mut skipped = 0;
        for outcome in outcomes {
            skipped += outcome.skipped;
            if let Some(error) = outcome.error {
                failures.push(SourceFailure {
                    source_id: outcome.source_id,
                    error,
                });
            }
            per_source.push(outcome.articles);
        }

        let articles = aggregate(per_source);
        let collection = Collection {
            fetched_at: run_time,
            sources: sources.iter().map(|s| s.source_id.clone()).collect(),
            articles,
            failures,
            skipped,
        };
        info!(
            total = collection.articles.len(),
            new = collection.new_articles(),
            skipped = collection.skipped,
            failed_sources = collection.failures.len(),
            "Collected articles"
        );
        collection
    }

    /// Upsert the batch once. Failures are reported, never retried.
    pub async fn sync(&self, articles: &[Article]) -> SyncStatus {
        let Some(store) = &self.store else {
            warn!("No store configured; skipping sync");
            return SyncStatus::Skipped;
        };
        match store.upsert(articles).await {
            Ok(synced) => {
                info!(synced, "Sync completed");
                SyncStatus::Synced { synced }
            }
            Err(error) => {
                error!(error = %error, "Sync failed");
                SyncStatus::Failed { error }
            }
        }
    }

    /// Collect, write the snapshot to `artifact` if given, then sync.
    ///
    /// A snapshot that cannot be written is logged and does not stop the
    /// sync.
    pub async fn run(&self, artifact: Option<&Path>) -> RunReport {
        let collection = self.collect().await;
        for failure in &collection.failures {
            warn!(source_id = %failure.source_id, error = %failure.error, "Source produced no articles");
        }

        if let Some(path) = artifact {
            if let Err(e) = write_snapshot(&collection.snapshot(), path).await {
                error!(path = %path.display(), error = %e, "Failed to write articles snapshot");
            }
        }

        let sync = self.sync(&collection.articles).await;
        RunReport { collection, sync }
    }
}
