mod background;
mod classifier;
mod refine;
mod regions;
pub mod types;

pub use background::{MixtureConfig, MixtureOfGaussians};
pub use classifier::MotionClassifier;
pub use refine::ForegroundRefiner;
pub use regions::{extract_regions, Region};
pub use types::{BackgroundModel, ForegroundEstimate};

use image::{GrayImage, RgbImage};

pub const DEFAULT_MIN_AREA: f64 = 3000.0;
pub const DEFAULT_THRESHOLD: u8 = 25;
pub const DEFAULT_DILATE_SIZE: u8 = 3;

/// Tunables for the whole detection chain
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub min_area: f64,
    pub threshold: u8,
    pub dilate_size: u8,
    pub mixture: MixtureConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_AREA,
            threshold: DEFAULT_THRESHOLD,
            dilate_size: DEFAULT_DILATE_SIZE,
            mixture: MixtureConfig::default(),
        }
    }
}

/// Result of running one frame through the detector
#[derive(Debug, Clone)]
pub struct Detection {
    pub motion: bool,
    pub regions: Vec<Region>,
    pub mask: GrayImage,
}

/// Create the default background model (mixture of Gaussians)
pub fn create_default_model(config: &DetectorConfig) -> Box<dyn BackgroundModel + Send> {
    Box::new(MixtureOfGaussians::new(config.mixture.clone()))
}

/// Background model, refiner, region extractor and classifier in sequence
pub struct MotionDetector {
    model: Box<dyn BackgroundModel + Send>,
    refiner: ForegroundRefiner,
    classifier: MotionClassifier,
}

impl MotionDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self::with_model(create_default_model(config), config)
    }

    pub fn with_model(model: Box<dyn BackgroundModel + Send>, config: &DetectorConfig) -> Self {
        Self {
            model,
            refiner: ForegroundRefiner::new(config.threshold, config.dilate_size),
            classifier: MotionClassifier::new(config.min_area),
        }
    }

    pub fn classifier(&self) -> &MotionClassifier {
        &self.classifier
    }

    /// Learn from a frame and report whether it contains motion
    pub fn process(&mut self, frame: &RgbImage) -> Detection {
        let _span = tracing::debug_span!("detect").entered();

        let gray = image::imageops::grayscale(frame);
        let estimate = self.model.apply(&gray);
        let mask = self.refiner.refine(&estimate);
        let regions = extract_regions(&mask);
        let motion = self.classifier.classify(&regions);

        if motion {
            tracing::debug!(
                "Motion in frame {}: {} regions, largest {:.0}",
                self.model.frames_seen(),
                regions.len(),
                regions.iter().map(|r| r.area).fold(0.0, f64::max)
            );
        }

        Detection {
            motion,
            regions,
            mask,
        }
    }
}
