use anyhow::{Context, Result};
use clap::Parser;
use motion_chime::capture::{CaptureSource, ImageSequence, WebcamCapture};
use motion_chime::detection::{DetectorConfig, MixtureConfig, MotionDetector};
use motion_chime::pipeline::{run_pipeline, PipelineConfig};
use motion_chime::playback::{AudioLibrary, AudioPlayer, PlaybackGate, SpeakerOutput};
use motion_chime::preview::{PreviewSink, V4L2Preview};
use motion_chime::startup::prepare;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Replay image files from this directory instead of using the webcam
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Requested capture width
    #[arg(long, default_value_t = 640)]
    capture_width: u32,

    /// Requested capture height
    #[arg(long, default_value_t = 480)]
    capture_height: u32,

    /// Maximum frames per second to process (0 = unlimited)
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Directory holding the audio clips
    #[arg(short, long, default_value = "audios/")]
    audio_dir: PathBuf,

    /// Audio file extensions to load, comma separated
    #[arg(long, value_delimiter = ',', default_value = "mp3")]
    audio_ext: Vec<String>,

    /// Smallest region area that counts as motion
    #[arg(long, default_value_t = 3000.0)]
    min_area: f64,

    /// Foreground cut applied before dilation (0-255)
    #[arg(long, default_value_t = 25)]
    threshold: u8,

    /// Side of the square dilation neighbourhood
    #[arg(long, default_value_t = 3)]
    dilate: u8,

    /// Seconds the gate stays closed after a clip finishes
    #[arg(long, default_value_t = 5.0)]
    cooldown_secs: f64,

    /// Frames over which the background model adapts
    #[arg(long, default_value_t = 500)]
    history: u32,

    /// Squared distance under which a pixel matches the background
    #[arg(long, default_value_t = 16.0)]
    var_threshold: f32,

    /// Unusable reads in a row before the camera counts as closed
    #[arg(long, default_value_t = 30)]
    max_read_failures: u32,

    /// v4l2loopback device to write an annotated preview to
    #[arg(long)]
    preview_device: Option<PathBuf>,

    /// Preview width
    #[arg(long, default_value_t = 640)]
    preview_width: u32,

    /// Preview height
    #[arg(long, default_value_t = 480)]
    preview_height: u32,

    /// Show the foreground mask in the preview instead of the camera image
    #[arg(long)]
    show_mask: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            min_area: self.min_area,
            threshold: self.threshold,
            dilate_size: self.dilate,
            mixture: MixtureConfig {
                history: self.history,
                variance_threshold: self.var_threshold,
                ..MixtureConfig::default()
            },
        }
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target_fps: Some(self.fps).filter(|&fps| fps > 0),
            max_read_failures: self.max_read_failures,
            show_mask: self.show_mask,
            ..PipelineConfig::default()
        }
    }

    fn cooldown(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.cooldown_secs)
            .with_context(|| format!("Invalid cooldown of {} seconds", self.cooldown_secs))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("motion-chime starting");
    tracing::info!("Minimum motion area: {}", args.min_area);
    tracing::info!("Cooldown: {}s", args.cooldown_secs);

    let cooldown = args.cooldown()?;
    let (library, mut capture) = prepare(&args.audio_dir, &args.audio_ext, || open_capture(&args))?;
    tracing::info!("Loaded {} audio clips", library.len());
    let (width, height) = capture.resolution();
    tracing::info!("Capture resolution: {}x{}", width, height);

    let mut preview = match &args.preview_device {
        Some(path) => Some(
            V4L2Preview::new(path, args.preview_width, args.preview_height)
                .context("Failed to initialize preview output")?,
        ),
        None => None,
    };
    if let Some(sink) = &preview {
        let (width, height) = sink.resolution();
        tracing::info!("Preview resolution: {}x{}", width, height);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("Failed to install Ctrl-C handler")?;
    tracing::info!("Press Ctrl+C to stop");

    let mut detector = MotionDetector::new(&args.detector_config());
    let gate = PlaybackGate::new();
    let player = AudioPlayer::new(Arc::new(library), Arc::new(SpeakerOutput::new()), cooldown);

    run_pipeline(
        &mut capture,
        &mut detector,
        &gate,
        &player,
        preview.as_mut().map(|p| p as &mut dyn PreviewSink),
        &args.pipeline_config(),
        &shutdown,
    );

    Ok(())
}

fn open_capture(args: &Args) -> Result<Box<dyn CaptureSource>> {
    match &args.replay {
        Some(dir) => Ok(Box::new(
            ImageSequence::from_dir(dir).context("Failed to open replay directory")?,
        )),
        None => Ok(Box::new(
            WebcamCapture::new(
                args.input_device,
                args.capture_width,
                args.capture_height,
                args.fps.max(1),
            )
            .context("Failed to initialize webcam capture")?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_chime::playback::DEFAULT_COOLDOWN;

    #[test]
    fn defaults_match_documented_tunables() {
        let args = Args::try_parse_from(["motion-chime"]).unwrap();
        let detector = args.detector_config();
        assert_eq!(detector, DetectorConfig::default());
        assert_eq!(args.audio_dir, PathBuf::from("audios/"));
        assert_eq!(args.audio_ext, vec!["mp3".to_string()]);
        assert_eq!(args.cooldown().unwrap(), DEFAULT_COOLDOWN);
        assert_eq!(args.pipeline_config().target_fps, Some(30));
    }

    #[test]
    fn extension_list_is_comma_separated() {
        let args = Args::try_parse_from(["motion-chime", "--audio-ext", "mp3,WAV,.ogg"]).unwrap();
        assert_eq!(args.audio_ext, vec!["mp3", "WAV", ".ogg"]);
    }

    #[test]
    fn negative_cooldown_is_rejected() {
        let args = Args::try_parse_from(["motion-chime", "--cooldown-secs=-1"]).unwrap();
        assert!(args.cooldown().is_err());
    }
}
