//! Mapping record types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::describer::Description;
use crate::optimizer::OptimizationSpec;
use crate::publisher::PublishedArtifact;

/// Errors from the mapping store.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Durable association between a source and its published artifact.
///
/// At most one live record exists per source identifier; re-processing the
/// same source updates the record in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Source identifier (URL or local path); unique key.
    pub source_id: String,
    pub artifact: PublishedArtifact,
    /// Snapshot of the spec the artifact was produced with; drives the
    /// identical-spec skip on re-runs.
    pub spec: OptimizationSpec,
    pub description: Option<Description>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MappingRecord {
    pub fn new(
        source_id: impl Into<String>,
        artifact: PublishedArtifact,
        spec: OptimizationSpec,
        description: Option<Description>,
    ) -> Self {
        let now = Utc::now();
        Self {
            source_id: source_id.into(),
            artifact,
            spec,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Description text for exports: empty unless generation completed.
    pub fn description_text(&self) -> &str {
        match &self.description {
            Some(d) if d.is_complete() => &d.text,
            _ => "",
        }
    }

    /// Whether the record's source was a local file rather than a URL.
    pub fn is_local_source(&self) -> bool {
        !(self.source_id.starts_with("http://") || self.source_id.starts_with("https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use crate::describer::Description;

    fn artifact() -> PublishedArtifact {
        PublishedArtifact {
            backend: BackendKind::Cloudfront,
            public_url: "https://cdn.example.com/a_1.webp".to_string(),
            remote_name: "a_1.webp".to_string(),
            extra: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_description_text_only_when_complete() {
        let mut record = MappingRecord::new(
            "https://ex.com/a.jpg",
            artifact(),
            OptimizationSpec::default(),
            None,
        );
        assert_eq!(record.description_text(), "");

        record.description = Some(Description::failed(vec![]));
        assert_eq!(record.description_text(), "");

        record.description = Some(Description::complete("a red ball", vec![]));
        assert_eq!(record.description_text(), "a red ball");
    }

    #[test]
    fn test_local_source_detection() {
        let remote = MappingRecord::new(
            "https://ex.com/a.jpg",
            artifact(),
            OptimizationSpec::default(),
            None,
        );
        assert!(!remote.is_local_source());

        let local = MappingRecord::new(
            "data/local_images/a.jpg",
            artifact(),
            OptimizationSpec::default(),
            None,
        );
        assert!(local.is_local_source());
    }

    #[test]
    fn test_record_roundtrip() {
        let record = MappingRecord::new(
            "https://ex.com/a.jpg",
            artifact(),
            OptimizationSpec::default(),
            Some(Description::complete("text", vec!["k".to_string()])),
        );
        let json = serde_json::to_string(&record).unwrap();
        let parsed: MappingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
