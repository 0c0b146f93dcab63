//! Feed list and pipeline settings.
//!
//! The configuration is a plain value handed to the pipeline when it is built.
//! It comes either from [`PipelineConfig::default`], which carries the
//! built-in feed list, or from a YAML file loaded with [`load_config`]:
//!
//! ```yaml
//! sources:
//!   - source_id: bens-bites
//!     display_name: "Ben's Bites"
//!     feed_url: https://www.bensbites.com/feed
//!     icon: "🍪"
//! page_image_sources: [techcrunch-ai]
//! feed_timeout_secs: 20
//! ```
//!
//! Every key other than `sources` is optional.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// User agent sent with every feed and article page request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; AINewsDashboard/1.0)";

const DEFAULT_FEED_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("source id {0:?} is configured more than once")]
    DuplicateSource(String),
    #[error("source {0:?} has an empty feed url")]
    EmptyFeedUrl(String),
}

/// One configured RSS/Atom endpoint with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Unique key, copied onto every article from this feed.
    pub source_id: String,
    pub display_name: String,
    pub feed_url: String,
    /// Glyph shown next to the source name.
    pub icon: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl FeedSource {
    pub fn new(source_id: &str, display_name: &str, feed_url: &str, icon: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            display_name: display_name.to_string(),
            feed_url: feed_url.to_string(),
            icon: icon.to_string(),
            enabled: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Settings for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Feeds in configuration order. This order decides which copy of a
    /// duplicated URL survives aggregation.
    pub sources: Vec<FeedSource>,
    /// Sources whose articles may be fetched to look for an Open Graph image
    /// when the feed itself carries none.
    #[serde(default)]
    pub page_image_sources: Vec<String>,
    #[serde(default = "default_feed_timeout_secs")]
    pub feed_timeout_secs: u64,
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum number of feeds fetched at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_feed_timeout_secs() -> u64 {
    DEFAULT_FEED_TIMEOUT_SECS
}

fn default_page_timeout_secs() -> u64 {
    DEFAULT_PAGE_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                FeedSource::new(
                    "bens-bites",
                    "Ben's Bites",
                    "https://www.bensbites.com/feed",
                    "🍪",
                ),
                FeedSource::new(
                    "techcrunch-ai",
                    "TechCrunch AI",
                    "https://techcrunch.com/category/artificial-intelligence/feed/",
                    "💚",
                ),
                FeedSource::new(
                    "rundown-ai",
                    "The Rundown AI",
                    "https://rss.beehiiv.com/feeds/2R3C6Bt5wj.xml",
                    "🏃",
                ),
            ],
            page_image_sources: vec!["techcrunch-ai".to_string()],
            feed_timeout_secs: DEFAULT_FEED_TIMEOUT_SECS,
            page_timeout_secs: DEFAULT_PAGE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject duplicate source ids and sources without a feed URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.source_id.as_str()) {
                return Err(ConfigError::DuplicateSource(source.source_id.clone()));
            }
            if source.feed_url.trim().is_empty() {
                return Err(ConfigError::EmptyFeedUrl(source.source_id.clone()));
            }
        }
        Ok(())
    }

    /// Enabled sources, in configuration order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter().filter(|source| source.enabled)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

/// Load a pipeline configuration from a YAML file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let config = PipelineConfig::from_yaml_str(&yaml)?;
    info!(sources = config.sources.len(), "Loaded feed configuration");
    Ok(config)
}
