use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub optimize: OptimizeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    /// Alt-text generation settings (absent = descriptions disabled).
    #[serde(default)]
    pub alt_text: Option<AltTextConfig>,
}

/// Publisher backend selection and credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Default backend when the caller does not request one explicitly.
    #[serde(default)]
    pub default: Option<BackendKind>,
    #[serde(default)]
    pub cloudfront: Option<CloudFrontConfig>,
    #[serde(default)]
    pub cloudinary: Option<CloudinaryConfig>,
}

/// Available publisher backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Cloudfront,
    Cloudinary,
}

impl BackendKind {
    /// Returns the string representation used in logs and stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Cloudfront => "cloudfront",
            BackendKind::Cloudinary => "cloudinary",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// S3 + CloudFront backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudFrontConfig {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// AWS region of the bucket (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,
    /// CloudFront distribution domain serving the bucket
    pub domain: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Cloudinary backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder prefix for uploaded assets (default: "images")
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_folder() -> String {
    "images".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Image optimization defaults applied to every item in a run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizeConfig {
    /// Maximum output width in pixels (None = never resize).
    #[serde(default)]
    pub max_width: Option<u32>,
    /// Encoding quality, 1-100 (default: 82)
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Try multiple encodings and keep the smallest (default: true)
    #[serde(default = "default_smart_format")]
    pub smart_format: bool,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            max_width: None,
            quality: default_quality(),
            smart_format: default_smart_format(),
        }
    }
}

fn default_quality() -> u8 {
    82
}

fn default_smart_format() -> bool {
    true
}

/// Mapping store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("imagehaul.db")
}

/// Batch execution tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Maximum items processed concurrently (1 = strictly sequential).
    #[serde(default = "default_parallel")]
    pub max_parallel_items: usize,
    /// Maximum attempts for transient network failures (default: 3)
    #[serde(default = "default_retry_attempts")]
    pub retry_max_attempts: u32,
    /// Base delay for exponential backoff in milliseconds (default: 500)
    #[serde(default = "default_retry_delay")]
    pub retry_base_delay_ms: u64,
    /// Timeout for fetching a remote source in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub fetch_timeout_secs: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_parallel_items: default_parallel(),
            retry_max_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_delay(),
            fetch_timeout_secs: default_timeout(),
        }
    }
}

fn default_parallel() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    500
}

/// AltText-style description service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AltTextConfig {
    pub api_key: String,
    /// API base URL (default: https://alttext.ai/api/v1)
    #[serde(default = "default_alt_text_base")]
    pub api_base: String,
    /// Keywords hinted to every generation request.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// When set, jobs are completed via webhook instead of polling.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Poll interval for asynchronous jobs in seconds (default: 2)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u32,
    /// Maximum poll attempts before giving up (default: 15)
    #[serde(default = "default_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_alt_text_base() -> String {
    "https://alttext.ai/api/v1".to_string()
}

fn default_poll_interval() -> u32 {
    2
}

fn default_poll_attempts() -> u32 {
    15
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub backend: SanitizedBackendConfig,
    pub optimize: OptimizeConfig,
    pub store: StoreConfig,
    pub batch: BatchConfig,
    pub alt_text_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<BackendKind>,
    pub cloudfront_configured: bool,
    pub cloudinary_configured: bool,
}

impl Config {
    /// Returns a copy safe to log or show to users.
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            backend: SanitizedBackendConfig {
                default: self.backend.default,
                cloudfront_configured: self.backend.cloudfront.is_some(),
                cloudinary_configured: self.backend.cloudinary.is_some(),
            },
            optimize: self.optimize.clone(),
            store: self.store.clone(),
            batch: self.batch.clone(),
            alt_text_enabled: self.alt_text.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_as_str() {
        assert_eq!(BackendKind::Cloudfront.as_str(), "cloudfront");
        assert_eq!(BackendKind::Cloudinary.as_str(), "cloudinary");
    }

    #[test]
    fn test_backend_kind_deserialize() {
        let kind: BackendKind = serde_json::from_str("\"cloudinary\"").unwrap();
        assert_eq!(kind, BackendKind::Cloudinary);
    }

    #[test]
    fn test_optimize_defaults() {
        let opt = OptimizeConfig::default();
        assert_eq!(opt.max_width, None);
        assert_eq!(opt.quality, 82);
        assert!(opt.smart_format);
    }

    #[test]
    fn test_batch_defaults() {
        let batch = BatchConfig::default();
        assert_eq!(batch.max_parallel_items, 4);
        assert_eq!(batch.retry_max_attempts, 3);
        assert_eq!(batch.retry_base_delay_ms, 500);
        assert_eq!(batch.fetch_timeout_secs, 30);
    }

    #[test]
    fn test_sanitized_hides_credentials() {
        let config = Config {
            backend: BackendConfig {
                default: Some(BackendKind::Cloudinary),
                cloudfront: None,
                cloudinary: Some(CloudinaryConfig {
                    cloud_name: "demo".to_string(),
                    api_key: "key".to_string(),
                    api_secret: "topsecret".to_string(),
                    folder: default_folder(),
                    timeout_secs: 30,
                }),
            },
            optimize: OptimizeConfig::default(),
            store: StoreConfig::default(),
            batch: BatchConfig::default(),
            alt_text: None,
        };

        let sanitized = config.sanitized();
        assert!(sanitized.backend.cloudinary_configured);
        assert!(!sanitized.backend.cloudfront_configured);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("topsecret"));
    }
}
