use crate::error::{ensure_non_empty, VisionResult};
use image::{Rgb, RgbImage};
use tracing::debug;

pub const DEFAULT_MAX_DIMENSION: u32 = 1200;

/// Downsamples so the longest side fits `max_dimension`.
///
/// Returns the raster plus the applied factor (1.0 when untouched). The factor
/// maps processed coordinates back to the original photo by division.
pub fn resize_for_processing(image: &RgbImage, max_dimension: u32) -> VisionResult<(RgbImage, f64)> {
    let (width, height) = image.dimensions();
    ensure_non_empty("scale", width, height)?;

    let longest = width.max(height);
    if longest <= max_dimension {
        return Ok((image.clone(), 1.0));
    }

    let scale = f64::from(max_dimension) / f64::from(longest);
    let new_width = ((f64::from(width) * scale) as u32).max(1);
    let new_height = ((f64::from(height) * scale) as u32).max(1);
    let resized = resize_area(image, new_width, new_height);
    debug!(
        from_width = width,
        from_height = height,
        to_width = new_width,
        to_height = new_height,
        scale,
        "downsampled for processing"
    );
    Ok((resized, scale))
}

/// Area-averaging resample: every destination pixel is the coverage-weighted
/// mean of the source pixels its footprint overlaps.
pub fn resize_area(image: &RgbImage, new_width: u32, new_height: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let x_taps = area_taps(width, new_width);
    let y_taps = area_taps(height, new_height);

    // horizontal pass into f32 rows, then vertical
    let mut rows = vec![[0f32; 3]; (new_width * height) as usize];
    for y in 0..height {
        for (dx, taps) in x_taps.iter().enumerate() {
            let mut acc = [0f32; 3];
            for &(sx, weight) in taps {
                let px = image.get_pixel(sx, y).0;
                for c in 0..3 {
                    acc[c] += f32::from(px[c]) * weight;
                }
            }
            rows[(y * new_width) as usize + dx] = acc;
        }
    }

    let mut out = RgbImage::new(new_width, new_height);
    for (dy, taps) in y_taps.iter().enumerate() {
        for dx in 0..new_width {
            let mut acc = [0f32; 3];
            for &(sy, weight) in taps {
                let px = rows[(sy * new_width + dx) as usize];
                for c in 0..3 {
                    acc[c] += px[c] * weight;
                }
            }
            let rgb = acc.map(|v| v.round().clamp(0.0, 255.0) as u8);
            out.put_pixel(dx, dy as u32, Rgb(rgb));
        }
    }
    out
}

fn area_taps(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f32)>> {
    let ratio = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|d| {
            let start = f64::from(d) * ratio;
            let end = (start + ratio).min(f64::from(src_len));
            let mut taps = Vec::new();
            let mut s = start.floor() as u32;
            while f64::from(s) < end && s < src_len {
                let lo = start.max(f64::from(s));
                let hi = end.min(f64::from(s) + 1.0);
                let cover = hi - lo;
                if cover > 1e-9 {
                    taps.push((s, (cover / (end - start)) as f32));
                }
                s += 1;
            }
            taps
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_images_are_untouched() {
        let img = RgbImage::from_pixel(640, 480, Rgb([10, 20, 30]));
        let (out, scale) = resize_for_processing(&img, 1200).unwrap();
        assert_eq!(scale, 1.0);
        assert_eq!(out.dimensions(), (640, 480));
    }

    #[test]
    fn longest_side_equal_to_ceiling_is_untouched() {
        let img = RgbImage::new(1200, 300);
        let (_, scale) = resize_for_processing(&img, 1200).unwrap();
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn large_images_are_scaled_to_ceiling() {
        let img = RgbImage::from_pixel(2400, 1000, Rgb([200, 200, 200]));
        let (out, scale) = resize_for_processing(&img, 1200).unwrap();
        assert!((scale - 0.5).abs() < 1e-12);
        assert_eq!(out.dimensions(), (1200, 500));
        assert_eq!(out.get_pixel(600, 250), &Rgb([200, 200, 200]));
    }

    #[test]
    fn portrait_images_scale_on_height() {
        let img = RgbImage::new(900, 3600);
        let (out, scale) = resize_for_processing(&img, 1200).unwrap();
        assert!((scale - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(out.height(), 1200);
        assert_eq!(out.width(), 300);
    }

    #[test]
    fn area_average_blends_covered_pixels() {
        let mut img = RgbImage::from_pixel(4, 2, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([255, 255, 255]));
        let out = resize_area(&img, 2, 1);
        // left 2x2 block has two white pixels out of four
        assert_eq!(out.get_pixel(0, 0).0[0], 128);
        assert_eq!(out.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn zero_sized_input_fails_fast() {
        let img = RgbImage::new(0, 10);
        assert!(resize_for_processing(&img, 1200).is_err());
    }
}
