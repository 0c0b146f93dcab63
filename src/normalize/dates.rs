//! Timestamp resolution and freshness classification.
//!
//! An entry's publication time is taken from the first tier that yields a
//! valid timestamp:
//!
//! 1. the structured `published` timestamp
//! 2. the structured `updated` timestamp
//! 3. the `published_text` string, tried against [`parse_date_text`]
//! 4. the run time, captured once per run
//!
//! Timestamps without a zone are read as UTC. Nothing here returns an error;
//! [`ResolvedDate::origin`] records which tier produced the value.

use crate::models::RawEntry;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// How long an article counts as new after publication.
pub const FRESHNESS_HOURS: i64 = 24;

const RFC822_NUMERIC_OFFSET: &str = "%a, %d %b %Y %H:%M:%S %z";
const RFC822_GMT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const ISO8601_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%z";
const ISO8601_NAIVE: &str = "%Y-%m-%dT%H:%M:%S";

/// Which tier a resolved timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrigin {
    Published,
    Updated,
    PublishedText,
    /// Nothing in the entry was usable.
    RunTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub at: DateTime<Utc>,
    pub origin: DateOrigin,
}

/// Resolve the publication time of `entry`, falling back to `run_time`.
pub fn resolve_date(entry: &RawEntry, run_time: DateTime<Utc>) -> ResolvedDate {
    if let Some(at) = entry.published {
        return ResolvedDate {
            at,
            origin: DateOrigin::Published,
        };
    }
    if let Some(at) = entry.updated {
        return ResolvedDate {
            at,
            origin: DateOrigin::Updated,
        };
    }
    if let Some(at) = entry.published_text.as_deref().and_then(parse_date_text) {
        return ResolvedDate {
            at,
            origin: DateOrigin::PublishedText,
        };
    }
    ResolvedDate {
        at: run_time,
        origin: DateOrigin::RunTime,
    }
}

/// Parse a feed date string.
///
/// Formats are tried in order: RFC 822 with a numeric offset
/// (`Tue, 24 Feb 2026 10:00:00 +0000`), RFC 822 with a literal `GMT`, then
/// ISO 8601 with an offset or `Z`. An ISO 8601 value without any offset is
/// read as UTC.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DateTime::parse_from_str(text, RFC822_NUMERIC_OFFSET)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, RFC822_GMT)
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            DateTime::parse_from_str(text, ISO8601_OFFSET)
                .or_else(|_| DateTime::parse_from_rfc3339(text))
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, ISO8601_NAIVE)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// True iff `published` lies no more than 24 hours before `now`.
///
/// Timestamps in the future count as new. Text that never parsed does not
/// get here: [`resolve_date`] has already replaced it with the run time.
pub fn is_within_24_hours(published: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - published <= TimeDelta::hours(FRESHNESS_HOURS)
}
