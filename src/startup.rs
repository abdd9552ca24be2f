use crate::playback::AudioLibrary;
use anyhow::{Context, Result};
use std::path::Path;

/// Load the audio clips, then open the frame source
///
/// The clips come first so that a bad audio directory fails before the camera
/// is touched.
pub fn prepare<C, F>(
    audio_dir: &Path,
    extensions: &[String],
    open_capture: F,
) -> Result<(AudioLibrary, C)>
where
    F: FnOnce() -> Result<C>,
{
    let library =
        AudioLibrary::load(audio_dir, extensions).context("Failed to load audio clips")?;
    let capture = open_capture()?;
    Ok((library, capture))
}
