use crate::detection::{Detection, MotionClassifier};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;

const QUALIFYING: Rgb<u8> = Rgb([255, 0, 0]);
const BELOW_THRESHOLD: Rgb<u8> = Rgb([0, 255, 0]);

/// Draw each region's bounding box over the frame, or over the refined mask
/// when `show_mask` is set. Regions large enough to count as motion are red.
pub fn annotate(
    frame: &RgbImage,
    detection: &Detection,
    classifier: &MotionClassifier,
    show_mask: bool,
) -> RgbImage {
    let mut canvas = if show_mask {
        DynamicImage::ImageLuma8(detection.mask.clone()).to_rgb8()
    } else {
        frame.clone()
    };

    for region in &detection.regions {
        let colour = if classifier.qualifies(region) {
            QUALIFYING
        } else {
            BELOW_THRESHOLD
        };
        draw_hollow_rect_mut(&mut canvas, region.bounds, colour);
    }

    canvas
}
