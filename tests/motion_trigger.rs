use image::{Rgb, RgbImage};
use motion_chime::capture::ImageSequence;
use motion_chime::detection::{DetectorConfig, MotionDetector};
use motion_chime::pipeline::{run_pipeline, PipelineConfig};
use motion_chime::playback::{
    AudioLibrary, AudioOutput, AudioPlayer, Clip, PlaybackError, PlaybackGate,
};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);
const OBJECT: Rgb<u8> = Rgb([245, 245, 245]);

#[derive(Default)]
struct RecordingOutput {
    played: Mutex<Vec<PathBuf>>,
}

impl AudioOutput for RecordingOutput {
    fn play(&self, clip: &Clip) -> Result<(), PlaybackError> {
        self.played.lock().unwrap().push(clip.path().to_path_buf());
        Ok(())
    }
}

fn library() -> Arc<AudioLibrary> {
    let clips = vec![
        Clip::from_samples("bark.mp3", 22050, 1, vec![100; 64]),
        Clip::from_samples("meow.mp3", 22050, 2, vec![-100; 64]),
    ];
    Arc::new(AudioLibrary::from_clips("clips", clips).unwrap())
}

fn empty_scene() -> RgbImage {
    RgbImage::from_pixel(200, 160, BACKGROUND)
}

fn with_object(mut frame: RgbImage, x0: u32, y0: u32, w: u32, h: u32) -> RgbImage {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            frame.put_pixel(x, y, OBJECT);
        }
    }
    frame
}

/// Ten empty frames, a 4131-area object (50x80 before dilation) in frame 11,
/// and a different 4331-area object (60x70) in frame 12
fn arrival_sequence() -> Vec<RgbImage> {
    let mut frames = vec![empty_scene(); 10];
    frames.push(with_object(empty_scene(), 10, 10, 50, 80));
    frames.push(with_object(empty_scene(), 120, 40, 60, 70));
    frames
}

fn wait_until_free(gate: &PlaybackGate, limit: Duration) {
    let start = Instant::now();
    while gate.is_occupied() {
        assert!(start.elapsed() < limit, "gate never released");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn motion_only_when_the_object_arrives() {
    let mut detector = MotionDetector::new(&DetectorConfig::default());

    let flags: Vec<bool> = arrival_sequence()
        .iter()
        .map(|frame| detector.process(frame).motion)
        .collect();

    let mut expected = vec![false; 10];
    expected.extend([true, true]);
    assert_eq!(flags, expected);
}

#[test]
fn one_playback_for_back_to_back_motion() {
    let output = Arc::new(RecordingOutput::default());
    let player = AudioPlayer::new(library(), output.clone(), Duration::from_millis(300));
    let gate = PlaybackGate::new();
    let mut detector = MotionDetector::new(&DetectorConfig::default());
    let mut source = ImageSequence::from_frames(arrival_sequence());

    let summary = run_pipeline(
        &mut source,
        &mut detector,
        &gate,
        &player,
        None,
        &PipelineConfig::default(),
        &AtomicBool::new(false),
    );

    assert_eq!(summary.frames, 12);
    assert_eq!(summary.motion_frames, 2);
    assert_eq!(summary.admitted, 1);
    assert_eq!(summary.suppressed, 1);

    wait_until_free(&gate, Duration::from_secs(5));
    assert_eq!(output.played.lock().unwrap().len(), 1);
}

#[test]
fn gate_reopens_after_cooldown() {
    let output = Arc::new(RecordingOutput::default());
    let player = AudioPlayer::new(library(), output.clone(), Duration::from_millis(50));
    let gate = PlaybackGate::new();
    let mut detector = MotionDetector::new(&DetectorConfig::default());
    let config = PipelineConfig::default();
    let running = AtomicBool::new(false);

    let mut first = ImageSequence::from_frames(arrival_sequence());
    run_pipeline(&mut first, &mut detector, &gate, &player, None, &config, &running);
    wait_until_free(&gate, Duration::from_secs(5));

    // Same detector: the scene is learned, a new object triggers again
    let frames = vec![
        empty_scene(),
        empty_scene(),
        with_object(empty_scene(), 60, 20, 70, 70),
    ];
    let mut second = ImageSequence::from_frames(frames);
    let summary = run_pipeline(&mut second, &mut detector, &gate, &player, None, &config, &running);

    assert_eq!(summary.admitted, 1);
    wait_until_free(&gate, Duration::from_secs(5));
    assert_eq!(output.played.lock().unwrap().len(), 2);
}

/// A 49x59 object dilates to 51x61, whose boundary encloses exactly 50x60.
/// Clearing corner pixels shaves half a unit off per corner.
fn object_with_area(clipped_corners: u32) -> RgbImage {
    let (x0, y0, w, h) = (40, 30, 49, 59);
    let mut frame = with_object(empty_scene(), x0, y0, w, h);
    let corners = [
        (x0, y0),
        (x0 + w - 1, y0 + h - 1),
        (x0 + w - 1, y0),
        (x0, y0 + h - 1),
    ];
    for &(x, y) in corners.iter().take(clipped_corners as usize) {
        frame.put_pixel(x, y, BACKGROUND);
    }
    frame
}

fn trigger_count(frame: RgbImage) -> (f64, u64) {
    let mut frames = vec![empty_scene(); 10];
    frames.push(frame);

    let mut detector = MotionDetector::new(&DetectorConfig::default());
    let mut largest = 0.0;
    for f in &frames {
        let detection = detector.process(f);
        largest = detection.regions.iter().map(|r| r.area).fold(largest, f64::max);
    }

    let gate = PlaybackGate::new();
    let player = AudioPlayer::new(library(), Arc::new(RecordingOutput::default()), Duration::ZERO);
    let summary = run_pipeline(
        &mut ImageSequence::from_frames(frames),
        &mut MotionDetector::new(&DetectorConfig::default()),
        &gate,
        &player,
        None,
        &PipelineConfig::default(),
        &AtomicBool::new(false),
    );
    wait_until_free(&gate, Duration::from_secs(5));

    (largest, summary.admitted)
}

#[test]
fn area_threshold_is_inclusive_end_to_end() {
    let (area, admitted) = trigger_count(object_with_area(0));
    assert_eq!(area, 3000.0);
    assert_eq!(admitted, 1);

    let (area, admitted) = trigger_count(object_with_area(2));
    assert_eq!(area, 2999.0);
    assert_eq!(admitted, 0);
}
