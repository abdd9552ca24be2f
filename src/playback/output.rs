use super::library::Clip;
use rodio::{OutputStream, PlayError, Sink, StreamError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to open audio output")]
    OutputInit(#[from] StreamError),

    #[error("failed to create audio sink")]
    Sink(#[from] PlayError),
}

/// Trait for audio destinations
pub trait AudioOutput: Send + Sync {
    /// Play a clip from its first sample, blocking until it has finished
    fn play(&self, clip: &Clip) -> Result<(), PlaybackError>;
}

/// Plays clips on the default output device
///
/// The device is opened for each clip and closed again afterwards, so the
/// stream always runs at the clip's own format and nothing is held between
/// triggers.
#[derive(Debug, Default)]
pub struct SpeakerOutput;

impl SpeakerOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutput for SpeakerOutput {
    fn play(&self, clip: &Clip) -> Result<(), PlaybackError> {
        let _span = tracing::debug_span!("play", clip = %clip.path().display()).entered();

        let (_stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;

        tracing::debug!(
            "Streaming {:.1}s at {} Hz, {} ch",
            clip.duration().as_secs_f32(),
            clip.sample_rate(),
            clip.channels()
        );

        sink.append(clip.stream());
        sink.sleep_until_end();

        Ok(())
    }
}
