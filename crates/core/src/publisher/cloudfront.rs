//! S3 + CloudFront publisher implementation.
//!
//! Objects are PUT into the configured bucket with AWS Signature V4 and
//! served publicly through the CloudFront distribution domain.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::{BackendKind, CloudFrontConfig};

use super::types::{
    unique_remote_name, PublishedArtifact, Publisher, PublisherError, UploadMetadata,
};

type HmacSha256 = Hmac<Sha256>;

/// S3 + CloudFront publisher.
pub struct CloudFrontPublisher {
    client: Client,
    config: CloudFrontConfig,
}

impl CloudFrontPublisher {
    /// Create a new CloudFront publisher.
    pub fn new(config: CloudFrontConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Virtual-hosted-style bucket endpoint.
    fn bucket_host(&self) -> String {
        format!(
            "{}.s3.{}.amazonaws.com",
            self.config.bucket, self.config.region
        )
    }

    /// Send a SigV4-signed request. `path` must be pre-encoded and start
    /// with `/`; `query` must already be in canonical (sorted) form.
    async fn send_signed(
        &self,
        method: &str,
        path: &str,
        query: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<reqwest::Response, PublisherError> {
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let host = self.bucket_host();
        let payload_hash = sha256_hex(&body);

        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, path, query, canonical_headers, signed_headers, payload_hash
        );

        let scope = format!("{}/{}/s3/aws4_request", date, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let key = signing_key(&self.config.secret_key, &date, &self.config.region);
        let signature = hex(&hmac_sha256(&key, string_to_sign.as_bytes()));
        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.config.access_key, scope, signed_headers, signature
        );

        let url = if query.is_empty() {
            format!("https://{}{}", host, path)
        } else {
            format!("https://{}{}?{}", host, path, query)
        };

        let mut request = match method {
            "PUT" => self.client.put(&url).body(body),
            _ => self.client.get(&url),
        };
        request = request
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("Authorization", authorization);
        if let Some(ct) = content_type {
            request = request.header("Content-Type", ct);
        }

        request.send().await.map_err(|e| {
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
        })
    }

    async fn error_from_response(response: reqwest::Response) -> PublisherError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        // Surface the backend diagnostic, truncated; bodies carry no secrets.
        let message: String = body.chars().take(200).collect();
        match status {
            401 | 403 => PublisherError::AuthenticationFailed(message),
            _ => PublisherError::Api { status, message },
        }
    }
}

#[async_trait]
impl Publisher for CloudFrontPublisher {
    fn name(&self) -> BackendKind {
        BackendKind::Cloudfront
    }

    async fn test_connection(&self) -> bool {
        match self
            .send_signed("GET", "/", "list-type=2&max-keys=1", Vec::new(), None)
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("S3 connection successful to bucket {}", self.config.bucket);
                true
            }
            Ok(response) => {
                warn!(
                    "S3 connection test failed for bucket {}: HTTP {}",
                    self.config.bucket,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!(
                    "S3 connection test failed for bucket {}: {}",
                    self.config.bucket, e
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
        let remote_name = unique_remote_name(file_name, metadata.format, Utc::now());
        let path = format!("/{}", urlencoding::encode(&remote_name));

        let response = self
            .send_signed(
                "PUT",
                &path,
                "",
                bytes.to_vec(),
                Some(metadata.content_type()),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let public_url = format!(
            "https://{}/{}",
            self.config.domain.trim_end_matches('/'),
            remote_name
        );
        debug!("Uploaded {} to s3://{}", remote_name, self.config.bucket);

        Ok(PublishedArtifact {
            backend: BackendKind::Cloudfront,
            public_url,
            remote_name: remote_name.clone(),
            extra: serde_json::json!({
                "s3_key": remote_name,
                "bucket": self.config.bucket,
            }),
        })
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex(&hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// SigV4 key derivation chain.
fn signing_key(secret: &str, date: &str, region: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, b"s3");
    hmac_sha256(&k_service, b"aws4_request")
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
