use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

/// Turns a foreground estimate into a clean binary mask
///
/// Thresholding drops weak responses; dilation with a square neighbourhood
/// closes small gaps so one object yields one connected region.
#[derive(Debug, Clone)]
pub struct ForegroundRefiner {
    cut: u8,
    radius: u8,
}

impl ForegroundRefiner {
    /// `cut` is the lowest estimate value kept as foreground; `dilate_size` is
    /// the side of the square neighbourhood (3 means 3x3). Even sizes round
    /// down to the next odd size.
    pub fn new(cut: u8, dilate_size: u8) -> Self {
        Self {
            cut,
            radius: dilate_size / 2,
        }
    }

    pub fn refine(&self, estimate: &GrayImage) -> GrayImage {
        let _span = tracing::debug_span!("refine").entered();

        let binary = self.threshold(estimate);
        if self.radius == 0 {
            return binary;
        }
        dilate(&binary, Norm::LInf, self.radius)
    }

    /// Values below the cut become 0, values at or above it become 255
    fn threshold(&self, estimate: &GrayImage) -> GrayImage {
        let mut binary = estimate.clone();
        for pixel in binary.pixels_mut() {
            *pixel = Luma([if pixel[0] >= self.cut { 255 } else { 0 }]);
        }
        binary
    }
}
