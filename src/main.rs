//! # Feed Sync
//!
//! A one-shot ingestion job that pulls a fixed set of RSS, Atom and JSON
//! feeds, normalizes every entry into a flat article record, deduplicates
//! across sources, writes a local JSON artifact and upserts the batch into a
//! PostgREST table.
//!
//! ## Usage
//!
//! ```sh
//! SUPABASE_URL=https://abc.supabase.co SUPABASE_ANON_KEY=... feed_sync
//! feed_sync --no-sync -o ./out/articles.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Every enabled source is fetched concurrently; one failing
//!    feed never stops the others
//! 2. **Normalizing**: Entries become [`models::Article`]s with clean text, a
//!    resolved date and a best-effort thumbnail
//! 3. **Aggregating**: Duplicate URLs are dropped and the set is sorted newest
//!    first
//! 4. **Output**: The snapshot is written locally, then upserted in one batch

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod config;
mod feeds;
mod models;
mod normalize;
mod outputs;
mod storage;
mod sync;
#[cfg(test)]
mod test_support;
mod utils;

use cli::Cli;
use config::{PipelineConfig, load_config};
use storage::RestStore;
use sync::{Pipeline, SyncStatus};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_sync starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, output = %args.output.display(), no_sync = args.no_sync, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => load_config(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load feed configuration");
            e
        })?,
        None => {
            info!("Using built-in feed configuration");
            PipelineConfig::default()
        }
    };
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency.max(1);
    }

    // Early check: the artifact directory must be writable
    let output_dir = args
        .output
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if let Err(e) = ensure_writable_dir(output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()?;

    let store = match args.storage_config() {
        Some(storage) => {
            let store =
                RestStore::new(client.clone(), &storage)?.with_timeout(config.feed_timeout());
            info!(endpoint = %store.endpoint(), "Storage configured");
            Some(store)
        }
        None if args.no_sync => {
            info!("Sync disabled by --no-sync");
            None
        }
        None => {
            warn!("Storage URL or key missing; articles will only be written locally");
            None
        }
    };

    // ---- Fetch, write artifact, sync ----
    let pipeline = Pipeline::new(config, client, store);
    let report = pipeline.run(Some(&args.output)).await;
    let summary = report.summary();

    let elapsed = start_time.elapsed();
    match &report.sync {
        SyncStatus::Synced { .. } | SyncStatus::Skipped => info!(
            synced = summary.synced,
            total = report.collection.articles.len(),
            new = report.collection.new_articles(),
            skipped = report.collection.skipped,
            failed_sources = report.collection.failures.len(),
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            "Execution complete"
        ),
        SyncStatus::Failed { error } => error!(
            error = %error,
            total = report.collection.articles.len(),
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            "Execution complete; sync failed"
        ),
    }

    Ok(())
}
