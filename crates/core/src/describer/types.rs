//! Description types and the describer contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors from the description service API. These stay internal to the
/// client; callers of [`Describer::describe`] only ever see a `Description`.
#[derive(Debug, thiserror::Error)]
pub enum DescribeError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

/// Generation status of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionStatus {
    /// Job handed off (webhook mode); an external receiver completes it.
    Pending,
    Complete,
    Failed,
}

impl DescriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionStatus::Pending => "pending",
            DescriptionStatus::Complete => "complete",
            DescriptionStatus::Failed => "failed",
        }
    }
}

/// A generated accessibility description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    /// Generated text; empty unless status is `Complete`.
    pub text: String,
    /// Keywords that were hinted to the generator.
    pub keywords: Vec<String>,
    pub status: DescriptionStatus,
}

impl Description {
    pub fn complete(text: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            text: text.into(),
            keywords,
            status: DescriptionStatus::Complete,
        }
    }

    pub fn failed(keywords: Vec<String>) -> Self {
        Self {
            text: String::new(),
            keywords,
            status: DescriptionStatus::Failed,
        }
    }

    pub fn pending(keywords: Vec<String>) -> Self {
        Self {
            text: String::new(),
            keywords,
            status: DescriptionStatus::Pending,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == DescriptionStatus::Complete
    }
}

/// Trait for description generators.
#[async_trait]
pub trait Describer: Send + Sync {
    /// Service name for logging.
    fn name(&self) -> &str;

    /// Generate a description for an already-public image URL. Never fails:
    /// errors degrade to a `Failed` description.
    async fn describe(&self, image_url: &str, keywords: &[String]) -> Description;

    /// Probe the service with the configured credentials.
    async fn test_connection(&self) -> bool;
}

/// Injectable sleep, so poll loops are deterministic under test.
#[async_trait]
pub trait Sleep: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleep backed by the tokio timer.
pub struct TokioSleep;

#[async_trait]
impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let complete = Description::complete("a dog", vec!["pet".to_string()]);
        assert!(complete.is_complete());
        assert_eq!(complete.text, "a dog");

        let failed = Description::failed(vec![]);
        assert_eq!(failed.status, DescriptionStatus::Failed);
        assert!(failed.text.is_empty());

        let pending = Description::pending(vec![]);
        assert_eq!(pending.status, DescriptionStatus::Pending);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&DescriptionStatus::Complete).unwrap(),
            "\"complete\""
        );
        let parsed: DescriptionStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, DescriptionStatus::Failed);
    }

    #[test]
    fn test_description_roundtrip() {
        let description = Description::complete("text", vec!["k1".to_string()]);
        let json = serde_json::to_string(&description).unwrap();
        let parsed: Description = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, description);
    }

    #[test]
    fn test_tokio_sleep_resolves() {
        tokio_test::block_on(TokioSleep.sleep(Duration::from_millis(1)));
    }
}
