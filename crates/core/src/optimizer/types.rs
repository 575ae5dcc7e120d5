//! Optimization parameters and results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::OptimizeConfig;

use super::formats::ImageKind;

/// Errors that can occur during optimization.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Quality must be within 1-100, got {0}")]
    InvalidQuality(u8),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Per-run optimization parameters, immutable once the batch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationSpec {
    /// Maximum output width in pixels; images are never upscaled.
    pub max_width: Option<u32>,
    /// Encoding quality, 1-100.
    pub quality: u8,
    /// Try multiple encodings and keep the smallest.
    pub smart_format: bool,
}

impl OptimizationSpec {
    pub fn new(max_width: Option<u32>, quality: u8, smart_format: bool) -> Self {
        Self {
            max_width,
            quality,
            smart_format,
        }
    }
}

impl Default for OptimizationSpec {
    fn default() -> Self {
        Self {
            max_width: None,
            quality: 82,
            smart_format: true,
        }
    }
}

impl From<&OptimizeConfig> for OptimizationSpec {
    fn from(config: &OptimizeConfig) -> Self {
        Self {
            max_width: config.max_width,
            quality: config.quality,
            smart_format: config.smart_format,
        }
    }
}

/// Output of a successful optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// The encoding that won (or `Gif` for animation pass-through).
    pub format: ImageKind,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Encoded bytes, ready for upload.
    pub bytes: Vec<u8>,
}

impl OptimizationResult {
    /// Size of the encoded output in bytes.
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
