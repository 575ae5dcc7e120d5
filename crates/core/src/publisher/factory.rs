//! Publisher backend resolution.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{BackendConfig, BackendKind};

use super::cloudfront::CloudFrontPublisher;
use super::cloudinary::CloudinaryPublisher;
use super::types::{Publisher, PublisherError};

/// Backends probed during credential inference, highest preference first.
/// The order is fixed so auto-selection stays deterministic when more than
/// one backend has complete credentials.
const INFERENCE_ORDER: [BackendKind; 2] = [BackendKind::Cloudinary, BackendKind::Cloudfront];

/// Resolve and construct the publisher for a run.
///
/// Precedence: explicitly requested backend, then the configured default,
/// then inference over which backends have complete credentials. Fails with
/// a configuration error before any item is processed when nothing
/// qualifies.
pub fn create_publisher(
    config: &BackendConfig,
    requested: Option<BackendKind>,
) -> Result<Arc<dyn Publisher>, PublisherError> {
    let kind = requested
        .or(config.default)
        .or_else(|| infer_backend(config))
        .ok_or_else(|| {
            PublisherError::Configuration(
                "No publisher backend available. Request one explicitly, set \
                 backend.default, or configure credentials under \
                 [backend.cloudinary] or [backend.cloudfront]."
                    .to_string(),
            )
        })?;

    info!("Using {} publisher", kind);
    build(config, kind)
}

fn infer_backend(config: &BackendConfig) -> Option<BackendKind> {
    for kind in INFERENCE_ORDER {
        if is_configured(config, kind) {
            debug!("Inferred {} backend from available credentials", kind);
            return Some(kind);
        }
    }
    None
}

fn is_configured(config: &BackendConfig, kind: BackendKind) -> bool {
    match kind {
        BackendKind::Cloudfront => config.cloudfront.is_some(),
        BackendKind::Cloudinary => config.cloudinary.is_some(),
    }
}

fn build(
    config: &BackendConfig,
    kind: BackendKind,
) -> Result<Arc<dyn Publisher>, PublisherError> {
    match kind {
        BackendKind::Cloudfront => {
            let cf = config.cloudfront.as_ref().ok_or_else(|| {
                PublisherError::Configuration(
                    "cloudfront backend selected but [backend.cloudfront] is not configured"
                        .to_string(),
                )
            })?;
            Ok(Arc::new(CloudFrontPublisher::new(cf.clone())))
        }
        BackendKind::Cloudinary => {
            let cl = config.cloudinary.as_ref().ok_or_else(|| {
                PublisherError::Configuration(
                    "cloudinary backend selected but [backend.cloudinary] is not configured"
                        .to_string(),
                )
            })?;
            Ok(Arc::new(CloudinaryPublisher::new(cl.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CloudFrontConfig, CloudinaryConfig};

    fn cloudfront_config() -> CloudFrontConfig {
        CloudFrontConfig {
            access_key: "AKIA".to_string(),
            secret_key: "secret".to_string(),
            bucket: "bucket".to_string(),
            region: "us-east-1".to_string(),
            domain: "cdn.example.com".to_string(),
            timeout_secs: 30,
        }
    }

    fn cloudinary_config() -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "images".to_string(),
            timeout_secs: 30,
        }
    }

    fn both_configured() -> BackendConfig {
        BackendConfig {
            default: None,
            cloudfront: Some(cloudfront_config()),
            cloudinary: Some(cloudinary_config()),
        }
    }

    #[test]
    fn test_explicit_request_wins() {
        let config = BackendConfig {
            default: Some(BackendKind::Cloudinary),
            ..both_configured()
        };
        let publisher = create_publisher(&config, Some(BackendKind::Cloudfront)).unwrap();
        assert_eq!(publisher.name(), BackendKind::Cloudfront);
    }

    #[test]
    fn test_configured_default_beats_inference() {
        let config = BackendConfig {
            default: Some(BackendKind::Cloudfront),
            ..both_configured()
        };
        let publisher = create_publisher(&config, None).unwrap();
        assert_eq!(publisher.name(), BackendKind::Cloudfront);
    }

    #[test]
    fn test_inference_prefers_cloudinary() {
        let publisher = create_publisher(&both_configured(), None).unwrap();
        assert_eq!(publisher.name(), BackendKind::Cloudinary);
    }

    #[test]
    fn test_inference_falls_back_to_cloudfront() {
        let config = BackendConfig {
            default: None,
            cloudfront: Some(cloudfront_config()),
            cloudinary: None,
        };
        let publisher = create_publisher(&config, None).unwrap();
        assert_eq!(publisher.name(), BackendKind::Cloudfront);
    }

    #[test]
    fn test_no_backend_is_configuration_error() {
        let result = create_publisher(&BackendConfig::default(), None);
        assert!(matches!(result, Err(PublisherError::Configuration(_))));
    }

    #[test]
    fn test_explicit_request_without_credentials_fails() {
        let config = BackendConfig {
            default: None,
            cloudfront: None,
            cloudinary: Some(cloudinary_config()),
        };
        let result = create_publisher(&config, Some(BackendKind::Cloudfront));
        assert!(matches!(result, Err(PublisherError::Configuration(_))));
    }
}
