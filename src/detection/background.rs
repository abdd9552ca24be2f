use super::types::{BackgroundModel, ForegroundEstimate};
use image::{GrayImage, Luma};

/// Tunables for the mixture-of-Gaussians model
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureConfig {
    /// Frames after which the learning rate stops decaying
    pub history: u32,
    /// Squared Mahalanobis distance under which a sample matches a component
    pub variance_threshold: f32,
    /// Variance given to newly created components
    pub initial_variance: f32,
    pub min_variance: f32,
    pub max_variance: f32,
    /// Components kept per pixel
    pub max_components: usize,
    /// Share of total weight that counts as background
    pub background_ratio: f32,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            history: 500,
            variance_threshold: 16.0,
            initial_variance: 15.0,
            min_variance: 4.0,
            max_variance: 75.0,
            max_components: 3,
            background_ratio: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Component {
    weight: f32,
    mean: f32,
    variance: f32,
}

/// Adaptive per-pixel mixture-of-Gaussians background model
///
/// Each pixel keeps up to `max_components` Gaussians over luminance, ordered by
/// weight. A sample matching one of the heaviest components (those making up
/// `background_ratio` of the weight) is background. The learning rate is
/// `1 / min(2 * frames, history)`, so the model settles quickly after start and
/// then follows gradual lighting change slowly.
pub struct MixtureOfGaussians {
    config: MixtureConfig,
    width: u32,
    height: u32,
    components: Vec<Component>,
    active: Vec<u8>,
    frames_seen: u64,
}

impl MixtureOfGaussians {
    pub fn new(config: MixtureConfig) -> Self {
        Self {
            config,
            width: 0,
            height: 0,
            components: Vec::new(),
            active: Vec::new(),
            frames_seen: 0,
        }
    }

    /// Start over from `frame`: one component per pixel centred on its value
    fn seed(&mut self, frame: &GrayImage) {
        let (width, height) = frame.dimensions();
        let k = self.slots();
        let pixels = (width * height) as usize;

        tracing::debug!("Seeding background model at {}x{}", width, height);

        self.width = width;
        self.height = height;
        self.components = vec![Component::default(); pixels * k];
        self.active = vec![1; pixels];
        for (i, value) in frame.as_raw().iter().enumerate() {
            self.components[i * k] = Component {
                weight: 1.0,
                mean: *value as f32,
                variance: self.config.initial_variance,
            };
        }
        self.frames_seen = 1;
    }

    fn slots(&self) -> usize {
        self.config.max_components.clamp(1, u8::MAX as usize)
    }

    fn learning_rate(&self) -> f32 {
        let span = (2 * self.frames_seen).min(self.config.history.max(1) as u64);
        1.0 / span.max(1) as f32
    }

    /// Update one pixel's mixture with `value`; returns true when it is background
    fn update_pixel(
        config: &MixtureConfig,
        modes: &mut [Component],
        active: &mut u8,
        value: f32,
        alpha: f32,
    ) -> bool {
        let mut n = *active as usize;
        let mut total_weight = 0.0f32;
        let mut background = false;
        let mut matched = false;

        let mut m = 0;
        while m < n {
            let mut weight = modes[m].weight * (1.0 - alpha);

            if !matched {
                let diff = value - modes[m].mean;
                let dist2 = diff * diff;
                let variance = modes[m].variance;

                if dist2 < config.variance_threshold * variance {
                    matched = true;
                    if total_weight < config.background_ratio {
                        background = true;
                    }

                    weight += alpha;
                    let k = alpha / weight;
                    modes[m].mean += k * diff;
                    modes[m].variance = (variance + k * (dist2 - variance))
                        .clamp(config.min_variance, config.max_variance);
                    modes[m].weight = weight;

                    // Keep components ordered by weight
                    let mut i = m;
                    while i > 0 && modes[i].weight > modes[i - 1].weight {
                        modes.swap(i, i - 1);
                        i -= 1;
                    }
                    total_weight += weight;
                    m += 1;
                    continue;
                }
            }

            modes[m].weight = weight;
            total_weight += weight;
            m += 1;
        }

        if !matched {
            if n < modes.len() {
                n += 1;
            }
            let slot = n - 1;
            total_weight += alpha - modes[slot].weight;
            modes[slot] = Component {
                weight: alpha,
                mean: value,
                variance: config.initial_variance,
            };
            let mut i = slot;
            while i > 0 && modes[i].weight > modes[i - 1].weight {
                modes.swap(i, i - 1);
                i -= 1;
            }
        }

        if total_weight > 0.0 {
            for mode in &mut modes[..n] {
                mode.weight /= total_weight;
            }
        }
        *active = n as u8;

        background
    }
}

impl BackgroundModel for MixtureOfGaussians {
    fn apply(&mut self, frame: &GrayImage) -> ForegroundEstimate {
        let _span = tracing::debug_span!("background_apply").entered();

        if self.frames_seen == 0 {
            self.seed(frame);
            return GrayImage::new(self.width, self.height);
        }
        if frame.dimensions() != (self.width, self.height) {
            tracing::warn!(
                "Frame size changed from {}x{} to {}x{}, relearning background",
                self.width,
                self.height,
                frame.width(),
                frame.height()
            );
            self.seed(frame);
            return GrayImage::new(self.width, self.height);
        }

        let alpha = self.learning_rate();
        let k = self.slots();
        let mut estimate = GrayImage::new(self.width, self.height);

        for (i, (value, out)) in frame
            .as_raw()
            .iter()
            .zip(estimate.pixels_mut())
            .enumerate()
        {
            let modes = &mut self.components[i * k..(i + 1) * k];
            let background =
                Self::update_pixel(&self.config, modes, &mut self.active[i], *value as f32, alpha);
            *out = Luma([if background { 0 } else { 255 }]);
        }

        self.frames_seen += 1;
        estimate
    }

    fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}
