//! Source identifier and fetch result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while acquiring source bytes.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Request timeout fetching {url}")]
    Timeout { url: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty response body from {url}")]
    EmptyBody { url: String },
}

impl SourceError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout { .. } | SourceError::Request { .. } => true,
            SourceError::Http { status, .. } => *status >= 500 || *status == 429,
            SourceError::Io { .. } | SourceError::EmptyBody { .. } => false,
        }
    }
}

/// Identifier of one batch item: a remote URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SourceId {
    Remote(String),
    Local(PathBuf),
}

impl SourceId {
    /// Classify a raw list entry. Anything with an http(s) scheme is remote,
    /// everything else is a local path.
    pub fn parse(entry: &str) -> Self {
        let entry = entry.trim();
        if entry.starts_with("http://") || entry.starts_with("https://") {
            SourceId::Remote(entry.to_string())
        } else {
            SourceId::Local(PathBuf::from(entry))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceId::Remote(_))
    }

    /// The canonical string key used in the mapping store.
    pub fn as_str(&self) -> String {
        match self {
            SourceId::Remote(url) => url.clone(),
            SourceId::Local(path) => path.display().to_string(),
        }
    }

    /// Best-effort original file name: the last path segment, with any URL
    /// query/fragment stripped and percent-encoding decoded. Empty when the
    /// URL has no usable path segment.
    pub fn file_name(&self) -> String {
        match self {
            SourceId::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or("");
                let segment = path.rsplit('/').next().unwrap_or("");
                urlencoding::decode(segment)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| segment.to_string())
            }
            SourceId::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Raw bytes of a source, ready for optimization.
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub bytes: Vec<u8>,
    /// Original file name (may be synthesized from the content hash).
    pub file_name: String,
    /// Lowercase hex SHA-256 of the bytes.
    pub content_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifies_urls_and_paths() {
        assert!(SourceId::parse("https://ex.com/a.jpg").is_remote());
        assert!(SourceId::parse("http://ex.com/a.jpg").is_remote());
        assert!(!SourceId::parse("photos/a.jpg").is_remote());
        assert!(!SourceId::parse("/abs/path/b.png").is_remote());
    }

    #[test]
    fn test_file_name_from_url() {
        let id = SourceId::parse("https://ex.com/img/photo.jpg?w=100#frag");
        assert_eq!(id.file_name(), "photo.jpg");
    }

    #[test]
    fn test_file_name_percent_decoded() {
        let id = SourceId::parse("https://ex.com/my%20dog.png");
        assert_eq!(id.file_name(), "my dog.png");
    }

    #[test]
    fn test_file_name_missing_segment() {
        let id = SourceId::parse("https://ex.com/");
        assert_eq!(id.file_name(), "");
    }

    #[test]
    fn test_file_name_from_local_path() {
        let id = SourceId::parse("data/local_images/cat.webp");
        assert_eq!(id.file_name(), "cat.webp");
    }

    #[test]
    fn test_transient_classification() {
        assert!(SourceError::Timeout {
            url: "u".to_string()
        }
        .is_transient());
        assert!(SourceError::Http {
            url: "u".to_string(),
            status: 503
        }
        .is_transient());
        assert!(!SourceError::Http {
            url: "u".to_string(),
            status: 404
        }
        .is_transient());
    }

    #[test]
    fn test_source_id_serialization() {
        let id = SourceId::Remote("https://ex.com/a.jpg".to_string());
        let json = serde_json::to_string(&id).unwrap();
        let parsed: SourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
