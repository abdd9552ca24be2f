use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use imageproc::rect::Rect;

/// One connected foreground blob found in a mask
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Area enclosed by the outer boundary, in pixels
    pub area: f64,
    /// Bounding box of the boundary
    pub bounds: Rect,
    /// Boundary polygon with collinear runs collapsed to their endpoints
    pub vertices: Vec<Point<i32>>,
}

impl Region {
    /// Build a region from a closed boundary traced around a blob
    pub fn from_boundary(boundary: &[Point<i32>]) -> Option<Self> {
        let first = boundary.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in boundary {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let vertices = compress_chain(boundary);
        Some(Self {
            area: polygon_area(&vertices),
            bounds: Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32),
            vertices,
        })
    }
}

/// Find the outermost blobs of a binary mask
///
/// Holes, and blobs sitting inside another blob's hole, are not reported, so a
/// single object is never counted as several regions. Pixels outside the mask
/// count as background, so blobs touching the frame edge are found too.
pub fn extract_regions(mask: &GrayImage) -> Vec<Region> {
    let _span = tracing::debug_span!("extract_regions").entered();

    // find_contours only starts an outer border after a background pixel in
    // the same row, so give every blob one.
    let (width, height) = mask.dimensions();
    let mut padded = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let boundary: Vec<Point<i32>> = c
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            Region::from_boundary(&boundary)
        })
        .collect()
}

/// Keep only the points where the boundary changes direction
fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect()
}

/// Shoelace area of a closed polygon
fn polygon_area(vertices: &[Point<i32>]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: i64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}
