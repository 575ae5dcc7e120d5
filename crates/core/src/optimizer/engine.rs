//! Optimization engine.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, ImageFormat};
use tracing::{debug, warn};

use super::formats::ImageKind;
use super::types::{OptimizationResult, OptimizationSpec, OptimizerError};

/// Candidate encodings tried when smart format is enabled, in tie-break
/// preference order.
const SMART_CANDIDATES: [ImageKind; 3] = [ImageKind::WebP, ImageKind::Jpeg, ImageKind::Png];

/// Optimize raw image bytes according to the optimization parameters.
///
/// Still images are decoded, downscaled to `max_width` when wider (aspect
/// ratio preserved, never upscaled) and re-encoded. Animated GIFs are
/// validated frame by frame and returned byte-identical.
pub fn optimize(
    bytes: &[u8],
    spec: &OptimizationSpec,
) -> Result<OptimizationResult, OptimizerError> {
    if spec.quality == 0 || spec.quality > 100 {
        return Err(OptimizerError::InvalidQuality(spec.quality));
    }

    let container = image::guess_format(bytes)
        .map_err(|_| OptimizerError::UnsupportedFormat("unrecognized image data".to_string()))?;

    if container == ImageFormat::Gif {
        if let Some(passthrough) = animation_passthrough(bytes)? {
            return Ok(passthrough);
        }
        // Single frame: treat as a still image.
    }

    let img = image::load_from_memory(bytes).map_err(|e| OptimizerError::Decode(e.to_string()))?;
    let img = apply_max_width(img, spec.max_width);
    let (width, height) = (img.width(), img.height());
    let has_alpha = img.color().has_alpha();

    if !spec.smart_format {
        // Fixed JPEG output; any alpha channel is flattened.
        let encoded = encode(&img, ImageKind::Jpeg, spec.quality)?;
        return Ok(OptimizationResult {
            format: ImageKind::Jpeg,
            width,
            height,
            bytes: encoded,
        });
    }

    let mut best: Option<(ImageKind, Vec<u8>)> = None;
    for kind in SMART_CANDIDATES {
        if has_alpha && !kind.supports_alpha() {
            continue;
        }
        match encode(&img, kind, spec.quality) {
            Ok(encoded) => {
                debug!("Candidate {}: {} bytes", kind, encoded.len());
                let better = match &best {
                    None => true,
                    Some((best_kind, best_bytes)) => {
                        (encoded.len(), kind.preference_rank())
                            < (best_bytes.len(), best_kind.preference_rank())
                    }
                };
                if better {
                    best = Some((kind, encoded));
                }
            }
            Err(e) => warn!("Candidate {} failed: {}", kind, e),
        }
    }

    let (format, encoded) = best.ok_or_else(|| {
        OptimizerError::Encode("no candidate encoding succeeded".to_string())
    })?;

    debug!("Chose {} ({} bytes, {}x{})", format, encoded.len(), width, height);

    Ok(OptimizationResult {
        format,
        width,
        height,
        bytes: encoded,
    })
}

/// Validate an animated GIF and return it untouched. `None` means the GIF
/// has a single frame and should go through the still-image path.
fn animation_passthrough(bytes: &[u8]) -> Result<Option<OptimizationResult>, OptimizerError> {
    let decoder =
        GifDecoder::new(Cursor::new(bytes)).map_err(|e| OptimizerError::Decode(e.to_string()))?;
    let (width, height) = decoder.dimensions();

    let mut frame_count = 0usize;
    for frame in decoder.into_frames() {
        frame.map_err(|e| OptimizerError::Decode(format!("bad animation frame: {}", e)))?;
        frame_count += 1;
    }

    if frame_count > 1 {
        debug!("Animated GIF ({} frames), passing through", frame_count);
        Ok(Some(OptimizationResult {
            format: ImageKind::Gif,
            width,
            height,
            bytes: bytes.to_vec(),
        }))
    } else {
        Ok(None)
    }
}

/// Downscale to `max_width` preserving aspect ratio. Never upscales.
fn apply_max_width(img: DynamicImage, max_width: Option<u32>) -> DynamicImage {
    let Some(max_width) = max_width else {
        return img;
    };
    if max_width == 0 || img.width() <= max_width {
        return img;
    }

    let (w, h) = (img.width(), img.height());
    let new_height = ((h as f64 * max_width as f64) / w as f64).round().max(1.0) as u32;
    debug!("Resizing {}x{} -> {}x{}", w, h, max_width, new_height);
    img.resize_exact(max_width, new_height, FilterType::Lanczos3)
}

fn encode(img: &DynamicImage, kind: ImageKind, quality: u8) -> Result<Vec<u8>, OptimizerError> {
    match kind {
        ImageKind::Jpeg => {
            // JPEG has no alpha channel; flatten before encoding.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let mut buf = Cursor::new(Vec::new());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| OptimizerError::Encode(e.to_string()))?;
            Ok(buf.into_inner())
        }
        ImageKind::Png => {
            let mut buf = Cursor::new(Vec::new());
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(|e| OptimizerError::Encode(e.to_string()))?;
            Ok(buf.into_inner())
        }
        ImageKind::WebP => {
            let rgba = img.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            Ok(encoder.encode(quality as f32).to_vec())
        }
        ImageKind::Gif => Err(OptimizerError::Encode(
            "animations are passed through, never re-encoded".to_string(),
        )),
    }
}
