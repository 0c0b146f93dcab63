//! Command-line interface definitions.
//!
//! Storage options can also be supplied through the environment, so a
//! scheduled job only needs `SUPABASE_URL` and `SUPABASE_ANON_KEY` set.

use crate::storage::StorageConfig;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one ingestion run.
///
/// # Examples
///
/// ```sh
/// # Built-in feeds, artifact only
/// feed_sync --no-sync
///
/// # Custom feed list, upsert into a different table
/// feed_sync -c feeds.yaml --storage-table staging_articles
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML feed configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path of the local JSON artifact
    #[arg(short, long, default_value = ".tmp/articles.json")]
    pub output: PathBuf,

    /// Skip the storage step
    #[arg(long)]
    pub no_sync: bool,

    /// Base URL of the storage API
    #[arg(long, env = "SUPABASE_URL")]
    pub storage_url: Option<String>,

    /// API key sent with storage requests
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub storage_key: Option<String>,

    /// Table articles are upserted into
    #[arg(long, env = "SUPABASE_TABLE", default_value = "articles")]
    pub storage_table: String,

    /// Maximum number of feeds fetched at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl Cli {
    /// Storage settings, or `None` when syncing is disabled or the URL or key
    /// is missing.
    pub fn storage_config(&self) -> Option<StorageConfig> {
        if self.no_sync {
            return None;
        }
        let base_url = self.storage_url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let api_key = self.storage_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(StorageConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            table: self.storage_table.clone(),
        })
    }
}
