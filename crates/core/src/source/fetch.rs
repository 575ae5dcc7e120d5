//! Source byte acquisition.

use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::retry::RetryPolicy;

use super::types::{FetchedSource, SourceError, SourceId};

/// Turns a `SourceId` into bytes: HTTP download with bounded retry for
/// remote sources, filesystem read for local ones.
pub struct SourceFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl SourceFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, retry }
    }

    /// Fetch the source bytes and compute their content hash.
    pub async fn fetch(&self, source: &SourceId) -> Result<FetchedSource, SourceError> {
        let bytes = match source {
            SourceId::Remote(url) => {
                self.retry
                    .run("source fetch", SourceError::is_transient, || {
                        self.download(url)
                    })
                    .await?
            }
            SourceId::Local(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| SourceError::Io {
                        path: path.clone(),
                        source: e,
                    })?
            }
        };

        let content_hash = content_hash(&bytes);
        let mut file_name = source.file_name();
        if file_name.is_empty() {
            // URL with no usable path segment: name after the content.
            file_name = format!("{}.img", &content_hash[..12]);
        }

        debug!(
            "Fetched {} ({} bytes, hash {})",
            source,
            bytes.len(),
            &content_hash[..12]
        );

        Ok(FetchedSource {
            bytes,
            file_name,
            content_hash,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout {
                    url: url.to_string(),
                }
            } else {
                SourceError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| SourceError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if bytes.is_empty() {
            return Err(SourceError::EmptyBody {
                url: url.to_string(),
            });
        }

        Ok(bytes.to_vec())
    }
}

/// Lowercase hex SHA-256 of the given bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
