//! Batch input sources.
//!
//! A batch is an ordered list of source identifiers, each either a remote
//! URL or a local file path. This module parses the input list and turns a
//! `SourceId` into bytes (with retry for remote fetches) plus a content hash.

mod fetch;
mod list;
mod types;

pub use fetch::SourceFetcher;
pub use list::parse_source_list;
pub use types::{FetchedSource, SourceError, SourceId};
