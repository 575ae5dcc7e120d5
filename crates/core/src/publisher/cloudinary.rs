//! Cloudinary publisher implementation.
//!
//! Uploads go to the unsigned-free upload API with a SHA-256 request
//! signature. Cloudinary transforms server-side, so this backend also
//! accepts a source URL directly (remote fetch fast path).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::{BackendKind, CloudinaryConfig};
use crate::optimizer::OptimizationSpec;
use crate::source::SourceId;

use super::types::{
    unique_remote_name, PublishedArtifact, Publisher, PublisherCapabilities, PublisherError,
    UploadMetadata,
};

/// Cloudinary publisher.
pub struct CloudinaryPublisher {
    client: Client,
    config: CloudinaryConfig,
    api_base: String,
}

impl CloudinaryPublisher {
    /// Create a new Cloudinary publisher.
    pub fn new(config: CloudinaryConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            api_base: "https://api.cloudinary.com".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Derive the unique public id (no extension; Cloudinary appends its own
    /// based on the delivered format).
    fn public_id_for(&self, file_name: &str) -> String {
        let remote = unique_remote_name(file_name, None, Utc::now());
        remote
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_string())
            .unwrap_or(remote)
    }

    /// Upload parameters common to byte and URL uploads. BTreeMap keeps the
    /// keys in the alphabetical order the signature requires.
    fn upload_params(&self, public_id: &str, spec: &OptimizationSpec) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("folder".to_string(), self.config.folder.clone());
        params.insert("public_id".to_string(), public_id.to_string());
        params.insert("timestamp".to_string(), Utc::now().timestamp().to_string());
        params.insert("invalidate".to_string(), "true".to_string());
        params.insert("overwrite".to_string(), "false".to_string());
        if let Some(t) = transformation(spec) {
            params.insert("transformation".to_string(), t);
        }
        params
    }

    fn sign(&self, params: &BTreeMap<String, String>) -> String {
        let to_sign = string_to_sign(params);
        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    async fn execute_upload(
        &self,
        file_part: Part,
        params: BTreeMap<String, String>,
    ) -> Result<PublishedArtifact, PublisherError> {
        let signature = self.sign(&params);

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublisherError::Timeout
                } else if e.is_connect() {
                    PublisherError::ConnectionFailed(e.to_string())
                } else {
                    PublisherError::Api {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PublisherError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(match status.as_u16() {
                401 | 403 => PublisherError::AuthenticationFailed(message),
                code => PublisherError::Api {
                    status: code,
                    message,
                },
            });
        }

        let public_url = body
            .get("secure_url")
            .and_then(|u| u.as_str())
            .ok_or_else(|| {
                PublisherError::InvalidResponse("upload succeeded but no URL returned".to_string())
            })?
            .to_string();
        let remote_name = body
            .get("public_id")
            .and_then(|p| p.as_str())
            .unwrap_or_default()
            .to_string();

        debug!("Uploaded {} to Cloudinary", remote_name);

        Ok(PublishedArtifact {
            backend: BackendKind::Cloudinary,
            public_url,
            remote_name,
            extra: body,
        })
    }
}

#[async_trait]
impl Publisher for CloudinaryPublisher {
    fn name(&self) -> BackendKind {
        BackendKind::Cloudinary
    }

    fn capabilities(&self) -> PublisherCapabilities {
        PublisherCapabilities { remote_fetch: true }
    }

    async fn test_connection(&self) -> bool {
        let url = format!(
            "{}/v1_1/{}/ping",
            self.api_base.trim_end_matches('/'),
            self.config.cloud_name
        );

        let result = self
            .client
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(
                    "Cloudinary connection successful for cloud {}",
                    self.config.cloud_name
                );
                true
            }
            Ok(response) => {
                warn!(
                    "Cloudinary connection test failed for cloud {}: HTTP {}",
                    self.config.cloud_name,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!(
                    "Cloudinary connection test failed for cloud {}: {}",
                    self.config.cloud_name, e
                );
                false
            }
        }
    }

    async fn upload_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        metadata: &UploadMetadata,
    ) -> Result<PublishedArtifact, PublisherError> {
        let public_id = self.public_id_for(file_name);
        let params = self.upload_params(&public_id, &metadata.spec);

        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(metadata.content_type())
            .map_err(|e| PublisherError::InvalidResponse(e.to_string()))?;

        self.execute_upload(part, params).await
    }

    async fn upload_from_source_url(
        &self,
        source_url: &str,
        metadata: &UploadMetadata,
    ) -> Result<PublishedArtifact, PublisherError> {
        let file_name = SourceId::parse(source_url).file_name();
        let public_id = self.public_id_for(&file_name);
        let params = self.upload_params(&public_id, &metadata.spec);

        debug!("Cloudinary fetching {} server-side", source_url);
        // The upload endpoint accepts a remote URL in place of file bytes.
        let part = Part::text(source_url.to_string());
        self.execute_upload(part, params).await
    }
}

/// Signature payload: sorted `key=value` pairs joined with `&`.
fn string_to_sign(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Cloudinary transformation string for an optimization spec. `c_limit`
/// scales down only, matching the no-upscale guarantee of the local path.
fn transformation(spec: &OptimizationSpec) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(width) = spec.max_width {
        parts.push(format!("c_limit,w_{}", width));
    }
    if spec.smart_format {
        parts.push("f_auto".to_string());
        parts.push("q_auto".to_string());
    } else {
        parts.push(format!("q_{}", spec.quality));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "images".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_string_to_sign_is_sorted() {
        let mut params = BTreeMap::new();
        params.insert("timestamp".to_string(), "123".to_string());
        params.insert("folder".to_string(), "images".to_string());
        params.insert("public_id".to_string(), "a_1".to_string());

        assert_eq!(
            string_to_sign(&params),
            "folder=images&public_id=a_1&timestamp=123"
        );
    }

    #[test]
    fn test_sign_deterministic() {
        let publisher = CloudinaryPublisher::new(test_config());
        let mut params = BTreeMap::new();
        params.insert("timestamp".to_string(), "123".to_string());

        let a = publisher.sign(&params);
        let b = publisher.sign(&params);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_transformation_with_width_and_smart_format() {
        let spec = OptimizationSpec::new(Some(600), 82, true);
        assert_eq!(
            transformation(&spec).unwrap(),
            "c_limit,w_600,f_auto,q_auto"
        );
    }

    #[test]
    fn test_transformation_fixed_quality() {
        let spec = OptimizationSpec::new(None, 75, false);
        assert_eq!(transformation(&spec).unwrap(), "q_75");
    }

    #[test]
    fn test_public_id_has_no_extension() {
        let publisher = CloudinaryPublisher::new(test_config());
        let public_id = publisher.public_id_for("Photo.JPG");
        assert!(public_id.starts_with("photo_"));
        assert!(!public_id.contains('.'));
    }

    #[test]
    fn test_remote_fetch_capability() {
        let publisher = CloudinaryPublisher::new(test_config());
        assert!(publisher.capabilities().remote_fetch);
    }

    #[test]
    fn test_upload_url() {
        let publisher = CloudinaryPublisher::new(test_config());
        assert_eq!(
            publisher.upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
