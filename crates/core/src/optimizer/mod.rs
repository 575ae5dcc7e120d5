//! Image optimization.
//!
//! Pure bytes-in/bytes-out: decode, optionally downscale, then either encode
//! to JPEG or race a fixed candidate set of encodings and keep the smallest.
//! Animations are validated and passed through untouched; re-encoding frames
//! would destroy motion. No I/O happens here.

mod engine;
mod formats;
mod types;

pub use engine::optimize;
pub use formats::ImageKind;
pub use types::{OptimizationResult, OptimizationSpec, OptimizerError};
