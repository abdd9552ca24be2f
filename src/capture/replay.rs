use super::{CaptureError, CaptureSource};
use anyhow::{Context, Result};
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Frame source that replays a fixed sequence of still images
///
/// Frames come either from image files in a directory, read in file-name
/// order, or from frames already held in memory. The stream closes after the
/// last frame.
pub struct ImageSequence {
    backend: SequenceBackend,
    width: u32,
    height: u32,
}

enum SequenceBackend {
    Files(VecDeque<PathBuf>),
    Frames(VecDeque<RgbImage>),
}

impl ImageSequence {
    /// Replay every regular file in `dir`, sorted by name
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read replay directory {}", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        tracing::info!("Replaying {} frames from {}", paths.len(), dir.display());

        let (width, height) = paths
            .iter()
            .find_map(|p| image::image_dimensions(p).ok())
            .unwrap_or((0, 0));

        Ok(Self {
            backend: SequenceBackend::Files(paths.into()),
            width,
            height,
        })
    }

    /// Replay in-memory frames in order
    pub fn from_frames(frames: Vec<RgbImage>) -> Self {
        let (width, height) = frames.first().map(|f| f.dimensions()).unwrap_or((0, 0));
        Self {
            backend: SequenceBackend::Frames(frames.into()),
            width,
            height,
        }
    }

    /// Number of frames not yet read
    pub fn remaining(&self) -> usize {
        match &self.backend {
            SequenceBackend::Files(paths) => paths.len(),
            SequenceBackend::Frames(frames) => frames.len(),
        }
    }
}

impl CaptureSource for ImageSequence {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        match &mut self.backend {
            SequenceBackend::Frames(frames) => Ok(frames.pop_front()),
            SequenceBackend::Files(paths) => {
                let Some(path) = paths.pop_front() else {
                    return Ok(None);
                };
                let decoded = image::open(&path)
                    .map_err(|e| CaptureError::Corrupt(format!("{}: {}", path.display(), e)))?;
                Ok(Some(decoded.to_rgb8()))
            }
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
