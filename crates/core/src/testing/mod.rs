//! Testing utilities and mock implementations.
//!
//! Mock publisher and describer for exercising the orchestrator without real
//! infrastructure, an instant sleep for poll loops, and generated image
//! fixtures.

mod mock_describer;
mod mock_publisher;

pub use mock_describer::{MockDescriber, RecordedDescribe};
pub use mock_publisher::{MockPublisher, RecordedUpload};

use async_trait::async_trait;
use std::time::Duration;

use crate::describer::Sleep;

/// Sleep that returns immediately, for deterministic poll-loop tests.
pub struct InstantSleep;

#[async_trait]
impl Sleep for InstantSleep {
    async fn sleep(&self, _duration: Duration) {}
}

/// Generated image fixtures.
pub mod fixtures {
    use image::codecs::gif::GifEncoder;
    use image::{DynamicImage, Frame, ImageBuffer, ImageFormat, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Opaque RGB gradient encoded as PNG.
    pub fn png_rgb(width: u32, height: u32) -> Vec<u8> {
        let buf = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) % 256) as u8,
            ])
        });
        encode_png(DynamicImage::ImageRgb8(buf))
    }

    /// RGBA image with a non-opaque alpha gradient encoded as PNG.
    pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
        let buf = ImageBuffer::from_fn(width, height, |x, _y| {
            Rgba([200, 64, 32, (x * 200 / width.max(1)) as u8])
        });
        encode_png(DynamicImage::ImageRgba8(buf))
    }

    /// Animated GIF with the given number of frames.
    pub fn animated_gif(frames: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut buf);
            let all: Vec<Frame> = (0..frames)
                .map(|i| {
                    Frame::new(RgbaImage::from_pixel(
                        16,
                        16,
                        Rgba([(i * 80) as u8, 120, 60, 255]),
                    ))
                })
                .collect();
            encoder.encode_frames(all).unwrap();
        }
        buf
    }

    /// Bytes no image decoder accepts.
    pub fn corrupt() -> Vec<u8> {
        b"this is definitely not an image payload".to_vec()
    }

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }
}
