//! Merging per-source article lists into one ordered, deduplicated set.

use crate::models::Article;
use itertools::Itertools;
use tracing::debug;

/// Merge per-source results.
///
/// Lists are concatenated in source configuration order and deduplicated by
/// `url`, keeping the first copy seen. The survivors are then sorted newest
/// first. The sort is stable, so articles with equal timestamps keep their
/// concatenation order and the output does not depend on which fetch
/// finished first.
pub fn aggregate(per_source: Vec<Vec<Article>>) -> Vec<Article> {
    let total: usize = per_source.iter().map(Vec::len).sum();
    let mut merged: Vec<Article> = per_source
        .into_iter()
        .flatten()
        .unique_by(|article| article.url.clone())
        .collect();
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    debug!(
        total,
        unique = merged.len(),
        duplicates = total - merged.len(),
        "Aggregated articles"
    );
    merged
}
