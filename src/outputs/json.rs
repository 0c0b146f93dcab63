//! JSON artifact for a single run.
//!
//! The artifact is written before the storage step, so it exists even when
//! the sync fails. Its shape:
//!
//! ```text
//! {
//!   "fetchedAt": "2026-02-24T12:00:00Z",
//!   "totalArticles": 3,
//!   "newArticles": 2,
//!   "sources": ["bens-bites", "techcrunch-ai", "rundown-ai"],
//!   "articles": [ ... ]
//! }
//! ```

use crate::models::Snapshot;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `snapshot` as pretty JSON to `path`, creating parent
/// directories as needed. An existing file is replaced.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(
        total = snapshot.total_articles,
        new = snapshot.new_articles,
        "Wrote articles snapshot"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use chrono::{TimeZone, Utc};

    fn snapshot() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).unwrap();
        let article = Article {
            id: "0123456789ab".to_string(),
            title: "Title".to_string(),
            summary: "Summary".to_string(),
            url: "https://example.com/a".to_string(),
            thumbnail: String::new(),
            source: "Example".to_string(),
            source_id: "example".to_string(),
            source_icon: "📰".to_string(),
            published_at: at,
            is_new: true,
        };
        Snapshot::new(at, vec!["example".to_string()], vec![article])
    }

    #[tokio::test]
    async fn test_write_snapshot_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tmp").join("articles.json");

        write_snapshot(&snapshot(), &path).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["fetchedAt"], "2026-02-24T12:00:00Z");
        assert_eq!(value["totalArticles"], 1);
        assert_eq!(value["newArticles"], 1);
        assert_eq!(value["sources"][0], "example");
        assert_eq!(value["articles"][0]["sourceId"], "example");
        assert_eq!(value["articles"][0]["isNew"], true);

        let parsed: Snapshot = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, snapshot());
    }

    #[tokio::test]
    async fn test_write_snapshot_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        tokio::fs::write(&path, "stale").await.unwrap();

        write_snapshot(&snapshot(), &path).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.starts_with('{'));
    }
}
