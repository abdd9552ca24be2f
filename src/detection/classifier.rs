use super::regions::Region;

/// Decides from region sizes whether a frame contains real motion
#[derive(Debug, Clone, Copy)]
pub struct MotionClassifier {
    min_area: f64,
}

impl MotionClassifier {
    pub fn new(min_area: f64) -> Self {
        Self { min_area }
    }

    /// True when any region is at least `min_area`; one answer per frame no
    /// matter how many regions qualify
    pub fn classify(&self, regions: &[Region]) -> bool {
        regions.iter().any(|r| self.qualifies(r))
    }

    pub fn qualifies(&self, region: &Region) -> bool {
        region.area >= self.min_area
    }
}
