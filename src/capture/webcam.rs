use super::{CaptureError, CaptureSource};
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

pub struct WebcamCapture {
    camera: Camera,
    device_index: u32,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    /// Open a webcam and start streaming, asking for the format closest to
    /// the requested resolution and frame rate
    pub fn new(device_index: u32, width: u32, height: u32, fps: u32) -> Result<Self> {
        tracing::info!(
            "Opening webcam {} near {}x{} @ {}fps",
            device_index,
            width,
            height,
            fps
        );

        let index = CameraIndex::Index(device_index);
        let closest = CameraFormat::new_from(width, height, FrameFormat::MJPEG, fps);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(closest));

        let mut camera = Camera::new(index, requested)
            .with_context(|| format!("Failed to open camera {}", device_index))?;

        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        let negotiated = camera.resolution();
        tracing::info!(
            "Webcam streaming at {}x{}",
            negotiated.width(),
            negotiated.height()
        );

        Ok(Self {
            camera,
            device_index,
            width: negotiated.width(),
            height: negotiated.height(),
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let frame = match self.camera.frame() {
            Ok(frame) => frame,
            Err(e) if !self.camera.is_stream_open() => {
                tracing::info!("Device closed: {} ({})", self.device_index, e);
                return Ok(None);
            }
            Err(e) => return Err(CaptureError::Corrupt(e.to_string())),
        };

        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Corrupt(e.to_string()))?;

        Ok(Some(decoded))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::debug!("Failed to stop camera stream: {}", e);
        }
    }
}
