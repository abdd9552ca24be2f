use super::PreviewSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, FourCC};

/// Writes preview frames to a v4l2loopback device as YUYV
pub struct V4L2Preview {
    file: File,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl V4L2Preview {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening preview device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        if let Err(e) = Self::announce_format(path, width, height) {
            tracing::warn!(
                "Could not set YUYV {}x{} on {}: {}",
                width,
                height,
                path.display(),
                e
            );
        }

        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open preview device at {}", path.display()))?;

        Ok(Self {
            file,
            width,
            height,
            buffer: Vec::with_capacity((width * height * 2) as usize),
        })
    }

    /// Tell the loopback driver which format the raw writes will carry
    fn announce_format(path: &Path, width: u32, height: u32) -> std::io::Result<()> {
        let device = Device::with_path(path)?;
        let mut format = Output::format(&device)?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(b"YUYV");
        let applied = Output::set_format(&device, &format)?;
        tracing::debug!("Preview format: {}", applied);
        Ok(())
    }
}

/// Pack an RGB frame into YUYV, sharing chroma between horizontal pixel pairs
fn pack_yuyv(frame: &RgbImage, out: &mut Vec<u8>) {
    out.clear();
    let row_len = frame.width() as usize * 3;
    if row_len == 0 {
        return;
    }

    for row in frame.as_raw().chunks_exact(row_len) {
        let mut pixels = row.chunks_exact(3);
        while let Some(left) = pixels.next() {
            let right = pixels.next().unwrap_or(left);
            let (y0, u0, v0) = luma_chroma(left);
            let (y1, u1, v1) = luma_chroma(right);
            out.extend_from_slice(&[
                y0,
                ((u0 as u16 + u1 as u16) / 2) as u8,
                y1,
                ((v0 as u16 + v1 as u16) / 2) as u8,
            ]);
        }
    }
}

/// BT.601 RGB to YUV
fn luma_chroma(rgb: &[u8]) -> (u8, u8, u8) {
    let (r, g, b) = (rgb[0] as f32, rgb[1] as f32, rgb[2] as f32);

    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.147 * r - 0.289 * g + 0.436 * b + 128.0;
    let v = 0.615 * r - 0.515 * g - 0.100 * b + 128.0;

    (
        y.clamp(0.0, 255.0) as u8,
        u.clamp(0.0, 255.0) as u8,
        v.clamp(0.0, 255.0) as u8,
    )
}

impl PreviewSink for V4L2Preview {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let resized;
        let frame = if frame.dimensions() != (self.width, self.height) {
            resized = image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            );
            &resized
        } else {
            frame
        };

        pack_yuyv(frame, &mut self.buffer);

        self.file
            .write_all(&self.buffer)
            .context("Failed to write frame to preview device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
