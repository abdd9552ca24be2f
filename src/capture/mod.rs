mod replay;
mod webcam;

pub use replay::ImageSequence;
pub use webcam::WebcamCapture;

use image::RgbImage;
use thiserror::Error;

/// Failure to obtain a usable frame from a source
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The frame could not be read or decoded; the next read may succeed
    #[error("corrupt frame: {0}")]
    Corrupt(String),
}

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Capture a single frame
    ///
    /// Returns `Ok(None)` once the device or stream is closed. A zero-sized
    /// frame or a `CaptureError` is transient and the caller should keep reading.
    fn capture_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}

impl<T: CaptureSource + ?Sized> CaptureSource for Box<T> {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        (**self).capture_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}
