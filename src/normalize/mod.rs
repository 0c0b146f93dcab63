//! Turning raw feed entries into canonical articles.
//!
//! # Submodules
//!
//! - [`text`]: Strips markup and collapses whitespace in titles and summaries
//! - [`dates`]: Resolves entry timestamps and classifies freshness
//! - [`images`]: Finds a representative image URL for an entry
//! - [`entry`]: Combines the above into one [`Article`](crate::models::Article)
//!
//! Nothing in here fails a run. Each resolver reports which fallback it used
//! instead of raising.

pub mod dates;
pub mod entry;
pub mod images;
pub mod text;
