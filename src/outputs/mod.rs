//! Local output files.
//!
//! - [`json`]: Writes the run [`Snapshot`](crate::models::Snapshot) artifact

pub mod json;
