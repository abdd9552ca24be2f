mod annotate;
mod loopback;

pub use annotate::annotate;
pub use loopback::V4L2Preview;

use anyhow::Result;
use image::RgbImage;

/// Trait for preview destinations
pub trait PreviewSink {
    /// Write a frame to the preview
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected preview resolution
    fn resolution(&self) -> (u32, u32);
}
