use super::gate::GatePermit;
use super::library::AudioLibrary;
use super::output::AudioOutput;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Plays a random clip for each admitted motion event
///
/// Every playback runs on its own thread holding the gate permit. The permit
/// is kept for `cooldown` after the clip ends and then dropped, which frees the
/// gate on every path out of the thread, failed playback included.
#[derive(Clone)]
pub struct AudioPlayer {
    library: Arc<AudioLibrary>,
    output: Arc<dyn AudioOutput>,
    cooldown: Duration,
}

impl AudioPlayer {
    pub fn new(library: Arc<AudioLibrary>, output: Arc<dyn AudioOutput>, cooldown: Duration) -> Self {
        Self {
            library,
            output,
            cooldown,
        }
    }

    /// Start a playback thread that owns `permit`
    ///
    /// If the thread cannot be spawned the permit is dropped with the closure
    /// and the gate is free again when this returns.
    pub fn spawn(&self, permit: GatePermit) -> std::io::Result<JoinHandle<()>> {
        let player = self.clone();
        thread::Builder::new()
            .name("playback".into())
            .spawn(move || player.play(permit))
    }

    fn play(&self, permit: GatePermit) {
        let clip = self.library.choose(&mut rand::thread_rng());
        let started = Instant::now();

        match self.output.play(clip) {
            Ok(()) => tracing::info!(
                "Audio played: {} ({:.1}s)",
                clip.path().display(),
                started.elapsed().as_secs_f32()
            ),
            Err(e) => tracing::warn!(
                "Playback of {} failed: {:#}",
                clip.path().display(),
                anyhow::Error::new(e)
            ),
        }

        thread::sleep(self.cooldown);
        drop(permit);
    }
}
