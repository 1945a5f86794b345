use crate::config::VisionConfig;
use crate::error::{ensure_non_empty, VisionResult};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use serde::Serialize;
use tracing::debug;

/// One closed outline reduced to its bounding box (image-pixel space).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedShape {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub area: f64,
    #[serde(skip)]
    pub contour: Vec<Point<i32>>,
}

impl DetectedShape {
    pub fn from_contour(contour: Vec<Point<i32>>) -> Self {
        let area = contour_area(&contour);
        let (x, y, width, height) = bounding_rect(&contour);
        Self {
            x,
            y,
            width,
            height,
            area,
            contour,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            f64::from(self.width) / f64::from(self.height)
        }
    }
}

/// Outer borders of top-level components only; anything drawn inside
/// another shape's hole is skipped.
pub fn find_external_contours(binary: &GrayImage) -> Vec<Vec<Point<i32>>> {
    if binary.width() == 0 || binary.height() == 0 {
        return Vec::new();
    }
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Shoelace area of the closed polygon through the points.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: i64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y)
        })
        .sum();
    (twice as f64).abs() / 2.0
}

pub fn bounding_rect(points: &[Point<i32>]) -> (u32, u32, u32, u32) {
    if points.is_empty() {
        return (0, 0, 0, 0);
    }
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);
    (
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    )
}

/// Douglas-Peucker on a closed ring. The ring is split at the vertex
/// farthest from the first point and each open half is simplified, so the
/// result never repeats its first vertex.
pub fn approx_poly_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n <= 3 || epsilon <= 0.0 {
        return points.to_vec();
    }
    let origin = points[0];
    let far = (1..n)
        .max_by_key(|&i| {
            let (dx, dy) = (i64::from(points[i].x - origin.x), i64::from(points[i].y - origin.y));
            dx * dx + dy * dy
        })
        .unwrap_or(n / 2);

    let first = &points[..=far];
    let mut second = points[far..].to_vec();
    second.push(origin);

    let mut out = approximate_polygon_dp(first, epsilon, false);
    out.pop();
    let mut tail = approximate_polygon_dp(&second, epsilon, false);
    tail.pop();
    out.extend(tail);
    out
}

/// Keeps contours with `min_contour_area <= area < max_background_ratio * image_area`
/// whose simplified polygon has an acceptable corner count.
pub fn filter_contours(
    contours: Vec<Vec<Point<i32>>>,
    image_area: f64,
    config: &VisionConfig,
) -> Vec<Vec<Point<i32>>> {
    let ceiling = image_area * config.max_background_ratio;
    contours
        .into_iter()
        .filter(|contour| {
            let area = contour_area(contour);
            if area < config.min_contour_area || area >= ceiling {
                return false;
            }
            let epsilon = config.approx_epsilon_ratio * arc_length(contour, true);
            let vertices = approx_poly_closed(contour, epsilon).len();
            (config.min_vertices..=config.max_vertices).contains(&vertices)
        })
        .collect()
}

/// Outermost qualifying shapes, sorted top-to-bottom then left-to-right.
pub fn extract_shapes(binary: &GrayImage, config: &VisionConfig) -> VisionResult<Vec<DetectedShape>> {
    let (width, height) = binary.dimensions();
    ensure_non_empty("extract", width, height)?;

    let contours = find_external_contours(binary);
    let traced = contours.len();
    let image_area = f64::from(width) * f64::from(height);
    let mut shapes: Vec<DetectedShape> = filter_contours(contours, image_area, config)
        .into_iter()
        .map(DetectedShape::from_contour)
        .collect();
    shapes.sort_by_key(|s| (s.y, s.x));

    debug!(traced, kept = shapes.len(), "extracted shapes");
    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::new(width, height)
    }

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }

    fn ring(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, t: u32) {
        fill(img, x0, y0, x1, y0 + t);
        fill(img, x0, y1 - t, x1, y1);
        fill(img, x0, y0, x0 + t, y1);
        fill(img, x1 - t, y0, x1, y1);
    }

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ]
    }

    fn permissive() -> VisionConfig {
        VisionConfig {
            min_contour_area: 1.0,
            ..VisionConfig::default()
        }
    }

    #[test]
    fn traces_filled_rectangle_corners() {
        let mut img = blank(40, 30);
        fill(&mut img, 5, 6, 25, 16);
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert_eq!(bounding_rect(contour), (5, 6, 20, 10));
        let eps = 0.02 * arc_length(contour, true);
        assert_eq!(approx_poly_closed(contour, eps).len(), 4);
        assert_eq!(contour_area(contour), 19.0 * 9.0);
    }

    #[test]
    fn single_pixel_is_a_degenerate_contour() {
        let mut img = blank(10, 10);
        img.put_pixel(4, 4, Luma([255]));
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].iter().all(|p| *p == Point::new(4, 4)));
        assert_eq!(contour_area(&contours[0]), 0.0);
        let kept = filter_contours(contours, 100.0, &permissive());
        assert!(kept.is_empty());
    }

    #[test]
    fn nested_shapes_are_ignored() {
        let mut img = blank(100, 80);
        ring(&mut img, 5, 5, 95, 75, 3);
        fill(&mut img, 30, 30, 60, 50);
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(bounding_rect(&contours[0]), (5, 5, 90, 70));
    }

    #[test]
    fn shapes_touching_the_frame_are_traced() {
        let mut img = blank(20, 20);
        fill(&mut img, 0, 0, 8, 8);
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(bounding_rect(&contours[0]), (0, 0, 8, 8));
    }

    #[test]
    fn ring_outer_border_encloses_full_area() {
        let mut img = blank(60, 50);
        ring(&mut img, 10, 10, 50, 40, 3);
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contour_area(&contours[0]), 39.0 * 29.0);
    }

    #[test]
    fn approximates_rectangle_to_four_vertices() {
        let mut dense = Vec::new();
        for x in 0..50 {
            dense.push(Point::new(x, 0));
        }
        for y in 0..30 {
            dense.push(Point::new(50, y));
        }
        for x in (1..=50).rev() {
            dense.push(Point::new(x, 30));
        }
        for y in (1..=30).rev() {
            dense.push(Point::new(0, y));
        }
        let eps = 0.02 * arc_length(&dense, true);
        let approx = approx_poly_closed(&dense, eps);
        assert_eq!(approx.len(), 4);
    }

    #[test]
    fn arc_length_of_closed_square() {
        assert_eq!(arc_length(&rect(0, 0, 10, 10), true), 40.0);
        assert_eq!(arc_length(&rect(0, 0, 10, 10), false), 30.0);
    }

    #[test]
    fn min_area_bound_is_inclusive() {
        let config = VisionConfig {
            min_contour_area: 500.0,
            ..VisionConfig::default()
        };
        let at_min = rect(10, 10, 25, 20);
        let below_min = rect(10, 10, 499, 1);
        assert_eq!(contour_area(&at_min), 500.0);
        let kept = filter_contours(vec![at_min.clone(), below_min], 100_000.0, &config);
        assert_eq!(kept, vec![at_min]);
    }

    #[test]
    fn background_ceiling_is_exclusive() {
        let config = permissive();
        let at_ceiling = rect(0, 0, 95, 100);
        let under_ceiling = rect(0, 0, 94, 100);
        assert_eq!(contour_area(&at_ceiling), 9_500.0);
        let kept = filter_contours(
            vec![at_ceiling, under_ceiling.clone()],
            10_000.0,
            &config,
        );
        assert_eq!(kept, vec![under_ceiling]);
    }

    #[test]
    fn jagged_contours_are_rejected() {
        // zig-zag outline: many corners survive simplification
        let mut jagged = Vec::new();
        for i in 0..20 {
            jagged.push(Point::new(i * 10, if i % 2 == 0 { 0 } else { 40 }));
        }
        jagged.push(Point::new(190, 200));
        jagged.push(Point::new(0, 200));
        let kept = filter_contours(vec![jagged], 1_000_000.0, &permissive());
        assert!(kept.is_empty());
    }

    #[test]
    fn shapes_are_sorted_by_row_then_column() {
        let mut img = blank(200, 150);
        fill(&mut img, 120, 10, 180, 40);
        fill(&mut img, 10, 10, 70, 40);
        fill(&mut img, 60, 90, 140, 130);
        let shapes = extract_shapes(&img, &permissive()).unwrap();
        let origins: Vec<(u32, u32)> = shapes.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(origins, vec![(10, 10), (120, 10), (60, 90)]);
        for pair in shapes.windows(2) {
            assert!((pair[0].y, pair[0].x) <= (pair[1].y, pair[1].x));
        }
    }

    #[test]
    fn blank_binary_yields_no_shapes() {
        let shapes = extract_shapes(&blank(64, 48), &VisionConfig::default()).unwrap();
        assert!(shapes.is_empty());
    }

    #[test]
    fn aspect_ratio_guards_zero_height() {
        let shape = DetectedShape {
            x: 0,
            y: 0,
            width: 10,
            height: 0,
            area: 0.0,
            contour: Vec::new(),
        };
        assert_eq!(shape.aspect_ratio(), 0.0);
    }
}
