#[cfg(test)]
pub(crate) mod fixtures;
mod gate;
mod library;
mod output;
mod player;

pub use gate::{GatePermit, PlaybackGate};
pub use library::{AudioLibrary, Clip, ClipError, ClipStream, LibraryError, MIN_CLIPS};
pub use output::{AudioOutput, PlaybackError, SpeakerOutput};
pub use player::{AudioPlayer, DEFAULT_COOLDOWN};
