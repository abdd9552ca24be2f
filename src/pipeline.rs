use crate::capture::CaptureSource;
use crate::detection::MotionDetector;
use crate::playback::{AudioPlayer, PlaybackGate};
use crate::preview::{annotate, PreviewSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Loop settings that are not part of detection or playback
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on processed frames per second; `None` runs as fast as the
    /// source delivers
    pub target_fps: Option<u32>,
    /// Consecutive unusable reads after which the source counts as closed
    pub max_read_failures: u32,
    /// Frames between timing reports
    pub stats_interval: u64,
    /// Preview the refined mask instead of the camera image
    pub show_mask: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fps: None,
            max_read_failures: 30,
            stats_interval: 30,
            show_mask: false,
        }
    }
}

/// Counters for one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Frames run through detection
    pub frames: u64,
    /// Reads that yielded no usable frame
    pub skipped: u64,
    /// Frames classified as motion
    pub motion_frames: u64,
    /// Motion frames that started playback
    pub admitted: u64,
    /// Motion frames ignored because playback was in progress
    pub suppressed: u64,
}

/// Run frames through detection until the source closes or `shutdown` is set
///
/// Motion frames try the gate; when it is free a playback thread is started and
/// the loop moves straight on to the next frame.
pub fn run_pipeline<C>(
    capture: &mut C,
    detector: &mut MotionDetector,
    gate: &PlaybackGate,
    player: &AudioPlayer,
    mut preview: Option<&mut dyn PreviewSink>,
    config: &PipelineConfig,
    shutdown: &AtomicBool,
) -> PipelineSummary
where
    C: CaptureSource,
{
    let frame_duration = config
        .target_fps
        .filter(|&fps| fps > 0)
        .map(|fps| Duration::from_secs_f32(1.0 / fps as f32));
    let mut summary = PipelineSummary::default();
    let mut failures_in_row = 0u32;
    let mut total_capture_time = Duration::ZERO;
    let mut total_detect_time = Duration::ZERO;
    let mut total_preview_time = Duration::ZERO;

    tracing::info!("Starting detection loop");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("Shutdown requested");
            break;
        }

        let loop_start = Instant::now();

        // Capture frame
        let capture_start = Instant::now();
        let read = capture.capture_frame();
        total_capture_time += capture_start.elapsed();

        let frame = match read {
            Ok(Some(frame)) if frame.width() > 0 && frame.height() > 0 => frame,
            Ok(None) => {
                tracing::info!("Frame source closed");
                break;
            }
            unusable => {
                if let Err(e) = unusable {
                    tracing::debug!("Skipping frame: {}", e);
                }
                summary.skipped += 1;
                failures_in_row += 1;
                if failures_in_row >= config.max_read_failures.max(1) {
                    tracing::warn!(
                        "{} unusable frames in a row, treating source as closed",
                        failures_in_row
                    );
                    break;
                }
                continue;
            }
        };
        failures_in_row = 0;

        // Detection
        let detect_start = Instant::now();
        let detection = detector.process(&frame);
        total_detect_time += detect_start.elapsed();
        summary.frames += 1;

        if detection.motion {
            summary.motion_frames += 1;
            match gate.try_acquire() {
                Some(permit) => match player.spawn(permit) {
                    Ok(_) => {
                        summary.admitted += 1;
                        tracing::info!("Motion detected, starting playback");
                    }
                    Err(e) => tracing::warn!("Failed to start playback thread: {}", e),
                },
                None => {
                    summary.suppressed += 1;
                    tracing::debug!("Motion detected while playback is active, ignoring");
                }
            }
        }

        // Preview
        if let Some(sink) = preview.as_deref_mut() {
            let preview_start = Instant::now();
            let annotated =
                annotate(&frame, &detection, detector.classifier(), config.show_mask);
            if let Err(e) = sink.write_frame(&annotated) {
                tracing::warn!("Disabling preview: {:#}", e);
                preview = None;
            }
            total_preview_time += preview_start.elapsed();
        }

        // Log stats every `stats_interval` frames
        if config.stats_interval > 0 && summary.frames % config.stats_interval == 0 {
            let frames = summary.frames as f64;
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frames;
            let avg_detect_ms = total_detect_time.as_secs_f64() * 1000.0 / frames;
            let avg_preview_ms = total_preview_time.as_secs_f64() * 1000.0 / frames;
            let total_ms = avg_capture_ms + avg_detect_ms + avg_preview_ms;

            tracing::info!(
                "Frame {}: capture={:.1}ms, detect={:.1}ms, preview={:.1}ms, total={:.1}ms, fps={:.1}, motion={}, played={}",
                summary.frames,
                avg_capture_ms,
                avg_detect_ms,
                avg_preview_ms,
                total_ms,
                1000.0 / total_ms.max(f64::EPSILON),
                summary.motion_frames,
                summary.admitted
            );
        }

        // Frame rate limiting
        if let Some(frame_duration) = frame_duration {
            let elapsed = loop_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }

    tracing::info!(
        "Detection loop finished: {} frames, {} skipped, {} with motion, {} played, {} suppressed",
        summary.frames,
        summary.skipped,
        summary.motion_frames,
        summary.admitted,
        summary.suppressed
    );

    summary
}
