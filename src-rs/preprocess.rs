//! Raster cleanup ahead of shape extraction.
//!
//! Sketch photos arrive with paper grain, pencil texture and uneven lighting.
//! The sequence here is fixed: grayscale, gaussian smoothing, local-mean
//! binarization (lines become 255), a closing then an opening with a square
//! element. A Canny edge map of the smoothed image is produced alongside for
//! debug output only.

use crate::config::{force_odd, AdaptiveMethod, ThresholdMode, VisionConfig};
use crate::error::{ensure_non_empty, VisionResult};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{box_filter, gaussian_blur_f32};
use imageproc::morphology::{close, open};
use tracing::debug;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

// LInf radius 2 is two passes of a 3x3 element, radius 1 is one pass.
const CLOSE_RADIUS: u8 = 2;
const OPEN_RADIUS: u8 = 1;

/// Runs the full cleanup and returns `(binary, edges)`.
pub fn preprocess_image(
    image: &DynamicImage,
    config: &VisionConfig,
) -> VisionResult<(GrayImage, GrayImage)> {
    ensure_non_empty("preprocess", image.width(), image.height())?;

    let gray = to_grayscale(image);
    let blurred = gaussian_blur(&gray, config.blur_kernel());
    let binary = match config.threshold_mode {
        ThresholdMode::Adaptive => adaptive_threshold(
            &blurred,
            config.adaptive_block(),
            config.adaptive_offset,
            config.adaptive_method,
        ),
        ThresholdMode::Global => global_threshold(&blurred, config.binary_threshold),
    };
    let cleaned = clean_binary(&binary);
    let edges = canny(
        &blurred,
        config.canny_low_threshold,
        config.canny_high_threshold,
    );

    debug!(
        width = gray.width(),
        height = gray.height(),
        kernel = config.blur_kernel(),
        mode = ?config.threshold_mode,
        method = ?config.adaptive_method,
        foreground = count_foreground(&cleaned),
        "preprocessed sketch"
    );
    Ok((cleaned, edges))
}

pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => rgb_to_luma(&other.to_rgb8()),
    }
}

// BT.601 weights; `image`'s own conversion uses Rec. 709.
fn rgb_to_luma(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Sigma a square gaussian kernel of `kernel_size` taps implies.
pub fn gaussian_sigma(kernel_size: u32) -> f32 {
    let k = force_odd(kernel_size) as f32;
    0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn gaussian_blur(image: &GrayImage, kernel_size: u32) -> GrayImage {
    if force_odd(kernel_size) <= 1 {
        return image.clone();
    }
    gaussian_blur_f32(image, gaussian_sigma(kernel_size))
}

/// Per-pixel neighbourhood mean over a `block` window, edges replicated.
pub fn local_mean(image: &GrayImage, block: u32, method: AdaptiveMethod) -> GrayImage {
    match method {
        AdaptiveMethod::Gaussian => gaussian_blur_f32(image, gaussian_sigma(block)),
        AdaptiveMethod::Mean => {
            let radius = force_odd(block) / 2;
            box_filter(image, radius, radius)
        }
    }
}

/// Inverted local threshold: a pixel becomes foreground when it is at least
/// `offset` darker than its neighbourhood mean.
pub fn adaptive_threshold(
    image: &GrayImage,
    block: u32,
    offset: i32,
    method: AdaptiveMethod,
) -> GrayImage {
    let mean = local_mean(image, block, method);
    let mut out = GrayImage::new(image.width(), image.height());
    for ((px, m), dst) in image.pixels().zip(mean.pixels()).zip(out.pixels_mut()) {
        let fg = i32::from(px.0[0]) <= i32::from(m.0[0]) - offset;
        *dst = Luma([if fg { FOREGROUND } else { BACKGROUND }]);
    }
    out
}

/// Single global cutoff, inverted: pixels at or below `cutoff` are lines.
pub fn global_threshold(image: &GrayImage, cutoff: u8) -> GrayImage {
    threshold(image, cutoff, ThresholdType::BinaryInverted)
}

/// Closing bridges small stroke gaps, opening then drops isolated specks.
pub fn clean_binary(binary: &GrayImage) -> GrayImage {
    let closed = close(binary, Norm::LInf, CLOSE_RADIUS);
    open(&closed, Norm::LInf, OPEN_RADIUS)
}

pub fn count_foreground(image: &GrayImage) -> usize {
    image.pixels().filter(|px| px.0[0] == FOREGROUND).count()
}
