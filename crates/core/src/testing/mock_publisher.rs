//! Mock publisher for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::BackendKind;
use crate::optimizer::ImageKind;
use crate::publisher::{
    PublishedArtifact, Publisher, PublisherCapabilities, PublisherError, UploadMetadata,
};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub file_name: String,
    pub bytes_len: usize,
    pub format: Option<ImageKind>,
    /// True when the upload went through the source-URL fast path.
    pub via_source_url: bool,
}

/// Mock implementation of the `Publisher` trait.
///
/// Records every upload, serves deterministic URLs, and fails on demand:
/// queued errors are consumed one per upload attempt.
#[derive(Clone)]
pub struct MockPublisher {
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    queued_errors: Arc<RwLock<VecDeque<PublisherError>>>,
    counter: Arc<RwLock<u64>>,
    connection_ok: Arc<RwLock<bool>>,
    remote_fetch: bool,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            queued_errors: Arc::new(RwLock::new(VecDeque::new())),
            counter: Arc::new(RwLock::new(0)),
            connection_ok: Arc::new(RwLock::new(true)),
            remote_fetch: false,
        }
    }

    /// Advertise the server-side fetch capability.
    pub fn with_remote_fetch(mut self) -> Self {
        self.remote_fetch = true;
        self
    }

    /// Queue an error; each upload attempt consumes one queued error first.
    pub async fn queue_error(&self, error: PublisherError) {
        self.queued_errors.write().await.push_back(error);
    }

    pub async fn set_connection_ok(&self, ok: bool) {
        *self.connection_ok.write().await = ok;
    }

    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    async fn next_artifact(&self, stem: &str) -> PublishedArtifact {
        let mut counter = self.counter.write().await;
        *counter += 1;
        let remote_name = format!("{}_{}", stem.to_lowercase(), *counter);
        PublishedArtifact {
            backend: BackendKind::Cloudfront,
            public_url: format!("https://mock.cdn/{}", remote_name),
            remote_name,
            extra: serde_json::Value::Null,
        }
    }

    async fn take_queued_error(&self) -> Option<PublisherError> {
        self.queued_errors.write().await.pop_front()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> BackendKind {
        BackendKind::Cloudfront
    }

    fn capabilities(&self) -> PublisherCapabilities {
        PublisherCapabilities {
            remote_fetch: self.remote_fetch,
        }
    }

    async fn test_connection(&self) -> bool {
        *self.connection_ok.read().await
    }

    async fn upload_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        metadata: &UploadMetadata,
    ) -> Result<PublishedArtifact, PublisherError> {
        if let Some(error) = self.take_queued_error().await {
            return Err(error);
        }

        self.uploads.write().await.push(RecordedUpload {
            file_name: file_name.to_string(),
            bytes_len: bytes.len(),
            format: metadata.format,
            via_source_url: false,
        });

        let stem = file_name.rsplit_once('.').map(|(s, _)| s).unwrap_or(file_name);
        Ok(self.next_artifact(stem).await)
    }

    async fn upload_from_source_url(
        &self,
        source_url: &str,
        _metadata: &UploadMetadata,
    ) -> Result<PublishedArtifact, PublisherError> {
        if !self.remote_fetch {
            return Err(PublisherError::RemoteFetchUnsupported(self.name()));
        }
        if let Some(error) = self.take_queued_error().await {
            return Err(error);
        }

        self.uploads.write().await.push(RecordedUpload {
            file_name: source_url.to_string(),
            bytes_len: 0,
            format: None,
            via_source_url: true,
        });

        Ok(self.next_artifact("remote").await)
    }
}
