//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Configuration for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum items processed concurrently (1 = strictly sequential).
    #[serde(default = "default_parallel")]
    pub max_parallel_items: usize,

    /// Verify publisher (and describer) connectivity before processing.
    /// A failed publisher preflight aborts the run; a failed describer
    /// preflight only disables descriptions.
    #[serde(default = "default_true")]
    pub preflight: bool,

    /// Generate accessibility descriptions for published images.
    #[serde(default)]
    pub generate_descriptions: bool,

    /// Keywords hinted to the description generator.
    #[serde(default)]
    pub description_keywords: Vec<String>,

    /// Hand remote source URLs to backends that can fetch and transform
    /// server-side instead of downloading locally.
    #[serde(default = "default_true")]
    pub use_remote_fast_path: bool,
}

fn default_parallel() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel_items: default_parallel(),
            preflight: default_true(),
            generate_descriptions: false,
            description_keywords: Vec::new(),
            use_remote_fast_path: default_true(),
        }
    }
}

impl OrchestratorConfig {
    /// Derive run settings from the root configuration. Descriptions are
    /// enabled when an alt-text section is configured.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_parallel_items: config.batch.max_parallel_items,
            preflight: true,
            generate_descriptions: config.alt_text.is_some(),
            description_keywords: config
                .alt_text
                .as_ref()
                .map(|a| a.keywords.clone())
                .unwrap_or_default(),
            use_remote_fast_path: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AltTextConfig;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_parallel_items, 4);
        assert!(config.preflight);
        assert!(!config.generate_descriptions);
        assert!(config.use_remote_fast_path);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            max_parallel_items = 1
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_parallel_items, 1);
        assert!(config.preflight);
    }

    #[test]
    fn test_from_config_enables_descriptions() {
        let mut root = Config::default();
        assert!(!OrchestratorConfig::from_config(&root).generate_descriptions);

        root.alt_text = Some(AltTextConfig {
            api_key: "k".to_string(),
            api_base: "https://alttext.ai/api/v1".to_string(),
            keywords: vec!["pets".to_string()],
            webhook_url: None,
            timeout_secs: 30,
            poll_interval_secs: 2,
            max_poll_attempts: 15,
        });
        let derived = OrchestratorConfig::from_config(&root);
        assert!(derived.generate_descriptions);
        assert_eq!(derived.description_keywords, vec!["pets".to_string()]);
    }
}
