//! Motion-triggered audio playback for a single camera.
//!
//! Frames from a [`capture::CaptureSource`] run through a
//! [`detection::MotionDetector`]; when a large enough moving region shows up
//! and no clip is playing, the [`playback::PlaybackGate`] admits one
//! [`playback::AudioPlayer`] run of a random clip.

pub mod capture;
pub mod detection;
pub mod pipeline;
pub mod playback;
pub mod preview;
pub mod startup;
