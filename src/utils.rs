//! Utility functions for article ids, string truncation, and file system checks.
//!
//! This module provides helpers used throughout the pipeline:
//! - Article id derivation from the canonical URL
//! - Character-safe truncation for summaries and log lines
//! - Output directory validation before a run starts

use md5::{Digest, Md5};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Length of an article id in hex characters.
pub const ARTICLE_ID_LEN: usize = 12;

/// Derive an article id from its URL.
///
/// The id is the first 12 hex characters of the MD5 digest of the URL bytes.
/// It depends on nothing but the URL, so the same link yields the same id on
/// every run and upserts land on the same row.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(article_id("https://example.com/a").len(), 12);
/// ```
pub fn article_id(url: &str) -> String {
    let digest = Md5::digest(url.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(ARTICLE_ID_LEN);
    id
}

/// Keep at most `max` characters of `s`.
///
/// Counts characters rather than bytes, so multi-byte text is never split.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_index, _)) => s[..byte_index].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        kept
    } else {
        let dropped = s.len() - kept.len();
        format!("{kept}…(+{dropped} bytes)")
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
