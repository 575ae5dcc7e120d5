//! Types for publisher backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendKind;
use crate::optimizer::{ImageKind, OptimizationSpec};

/// Errors that can occur during publish operations.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// Credentials rejected. Fatal for the whole run.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Backend misconfigured (missing credentials, unknown bucket name in
    /// config). Fatal for the whole run.
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    /// Error response from the backend API.
    #[error("API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend cannot fetch a source URL server-side.
    #[error("Remote fetch not supported by {0}")]
    RemoteFetchUnsupported(BackendKind),

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl PublisherError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PublisherError::Timeout | PublisherError::ConnectionFailed(_) => true,
            PublisherError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Fatal errors abort the whole run instead of failing one item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PublisherError::AuthenticationFailed(_) | PublisherError::Configuration(_)
        )
    }
}

/// What a backend can do beyond plain byte uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublisherCapabilities {
    /// The backend can fetch a source URL and transform it server-side.
    pub remote_fetch: bool,
}

/// A successfully published image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub backend: BackendKind,
    /// Public URL serving the image.
    pub public_url: String,
    /// Backend-side identifier (object key or public id). Globally unique.
    pub remote_name: String,
    /// Backend-specific metadata, stored verbatim.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Per-upload metadata handed to a publisher.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    /// Encoding of the uploaded bytes (None when the backend transforms
    /// server-side and decides the final format itself).
    pub format: Option<ImageKind>,
    /// Optimization parameters; used by backends with server-side
    /// transformation, ignored by plain object stores.
    pub spec: OptimizationSpec,
}

impl UploadMetadata {
    pub fn new(format: Option<ImageKind>, spec: OptimizationSpec) -> Self {
        Self { format, spec }
    }

    pub fn content_type(&self) -> &'static str {
        self.format
            .map(|f| f.content_type())
            .unwrap_or("application/octet-stream")
    }
}

/// Trait for publisher backends.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Backend identity for logging and stored records.
    fn name(&self) -> BackendKind;

    fn capabilities(&self) -> PublisherCapabilities {
        PublisherCapabilities::default()
    }

    /// Probe the backend with the configured credentials.
    async fn test_connection(&self) -> bool;

    /// Upload already-optimized bytes under a fresh, globally unique remote
    /// name derived from `file_name`.
    async fn upload_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        metadata: &UploadMetadata,
    ) -> Result<PublishedArtifact, PublisherError>;

    /// Fast path: hand the source URL to the backend for server-side
    /// fetch-and-transform. Backends without the capability return
    /// `RemoteFetchUnsupported`; callers then optimize locally and use
    /// [`Publisher::upload_bytes`].
    async fn upload_from_source_url(
        &self,
        source_url: &str,
        metadata: &UploadMetadata,
    ) -> Result<PublishedArtifact, PublisherError> {
        let _ = (source_url, metadata);
        Err(PublisherError::RemoteFetchUnsupported(self.name()))
    }
}

/// Build a unique remote name from an original file name.
///
/// The stem is lowercased and slugged, the extension replaced by the output
/// format's, and a millisecond timestamp appended so re-publishing the same
/// logical source never overwrites the previous artifact (cache busting).
pub fn unique_remote_name(file_name: &str, format: Option<ImageKind>, now: DateTime<Utc>) -> String {
    let lower = file_name.to_lowercase();
    let (stem, original_ext) = match lower.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
        _ => (lower.clone(), None),
    };

    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    };

    let ext = format
        .map(|f| f.extension().to_string())
        .or(original_ext)
        .unwrap_or_else(|| "img".to_string());

    format!("{}_{}.{}", stem, now.timestamp_millis(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_unique_name_replaces_extension() {
        let name = unique_remote_name("Photo.PNG", Some(ImageKind::WebP), at(1_700_000_000_000));
        assert_eq!(name, "photo_1700000000000.webp");
    }

    #[test]
    fn test_unique_name_keeps_original_extension_without_format() {
        let name = unique_remote_name("photo.gif", None, at(1_000));
        assert_eq!(name, "photo_1000.gif");
    }

    #[test]
    fn test_unique_name_slugs_special_characters() {
        let name = unique_remote_name("my dog (1).jpg", Some(ImageKind::Jpeg), at(42));
        assert_eq!(name, "my_dog__1__42.jpg");
    }

    #[test]
    fn test_unique_name_handles_missing_stem() {
        let name = unique_remote_name("", Some(ImageKind::Png), at(7));
        assert_eq!(name, "image_7.png");
    }

    #[test]
    fn test_distinct_timestamps_never_collide() {
        let a = unique_remote_name("a.jpg", Some(ImageKind::Jpeg), at(1));
        let b = unique_remote_name("a.jpg", Some(ImageKind::Jpeg), at(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_transient_classification() {
        assert!(PublisherError::Timeout.is_transient());
        assert!(PublisherError::Api {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());
        assert!(!PublisherError::Api {
            status: 404,
            message: "no such bucket".to_string()
        }
        .is_transient());
        assert!(!PublisherError::AuthenticationFailed("denied".to_string()).is_transient());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(PublisherError::AuthenticationFailed("denied".to_string()).is_fatal());
        assert!(PublisherError::Configuration("missing".to_string()).is_fatal());
        assert!(!PublisherError::Timeout.is_fatal());
    }

    #[test]
    fn test_artifact_serialization() {
        let artifact = PublishedArtifact {
            backend: BackendKind::Cloudfront,
            public_url: "https://cdn.example.com/a_1.webp".to_string(),
            remote_name: "a_1.webp".to_string(),
            extra: serde_json::json!({ "s3_key": "a_1.webp" }),
        };
        let json = serde_json::to_string(&artifact).unwrap();
        let parsed: PublishedArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, artifact);
    }
}
