//! Feed retrieval and parsing.
//!
//! - [`parser`]: RSS, Atom and JSON Feed payloads into [`RawEntry`](crate::models::RawEntry) values
//! - [`fetcher`]: One source end to end, from HTTP GET to normalized articles
//!
//! A source that cannot be fetched or parsed yields an empty article list and
//! a recorded error. It never stops the other sources.

pub mod fetcher;
pub mod parser;
