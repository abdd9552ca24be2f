use image::GrayImage;

/// Per-pixel foreground estimate: 0 = background, 255 = foreground
/// Dimensions match the input frame dimensions
pub type ForegroundEstimate = GrayImage;

/// Trait for adaptive background models
/// Allows swapping the statistical model behind the detector
pub trait BackgroundModel {
    /// Update the model with a frame and return its foreground estimate
    ///
    /// # Arguments
    /// * `frame` - Grayscale frame
    ///
    /// # Returns
    /// * Estimate with the same dimensions as `frame`
    fn apply(&mut self, frame: &GrayImage) -> ForegroundEstimate;

    /// Number of frames the model has learned from
    fn frames_seen(&self) -> u64;
}
