use super::{types::Config, BackendKind, ConfigError};

/// Validate configuration
/// Currently validates:
/// - quality is within 1-100
/// - batch.max_parallel_items is not 0
/// - a configured default backend has its credentials section present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.optimize.quality == 0 || config.optimize.quality > 100 {
        return Err(ConfigError::ValidationError(format!(
            "optimize.quality must be within 1-100, got {}",
            config.optimize.quality
        )));
    }

    if config.batch.max_parallel_items == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_parallel_items cannot be 0".to_string(),
        ));
    }

    match config.backend.default {
        Some(BackendKind::Cloudfront) if config.backend.cloudfront.is_none() => {
            return Err(ConfigError::ValidationError(
                "backend.default is cloudfront but [backend.cloudfront] is missing".to_string(),
            ));
        }
        Some(BackendKind::Cloudinary) if config.backend.cloudinary.is_none() => {
            return Err(ConfigError::ValidationError(
                "backend.default is cloudinary but [backend.cloudinary] is missing".to_string(),
            ));
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, Config};

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_quality_out_of_range() {
        let mut config = Config::default();
        config.optimize.quality = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));

        config.optimize.quality = 101;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_parallelism() {
        let mut config = Config::default();
        config.batch.max_parallel_items = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_default_backend_without_credentials() {
        let config = Config {
            backend: BackendConfig {
                default: Some(BackendKind::Cloudfront),
                cloudfront: None,
                cloudinary: None,
            },
            ..Config::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("cloudfront"));
    }
}
