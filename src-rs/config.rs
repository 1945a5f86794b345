use crate::error::{VisionError, VisionResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_DEVICE: &str = "macbook";

/// Named output canvases. Unknown names resolve to [`DEFAULT_DEVICE`].
pub const DEVICE_CANVAS_SIZES: &[(&str, u32, u32)] = &[("macbook", 1440, 900), ("iphone", 393, 852)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    Adaptive,
    Global,
}

/// Weighting of the neighbourhood mean in adaptive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveMethod {
    Gaussian,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub min_contour_area: f64,
    pub blur_kernel_size: u32,
    pub threshold_mode: ThresholdMode,
    pub binary_threshold: u8,
    pub adaptive_method: AdaptiveMethod,
    pub adaptive_block_size: u32,
    pub adaptive_offset: i32,
    pub canny_low_threshold: f32,
    pub canny_high_threshold: f32,
    pub max_dimension: u32,
    pub default_canvas_width: u32,
    pub default_canvas_height: u32,
    pub max_background_ratio: f64,
    pub approx_epsilon_ratio: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 500.0,
            blur_kernel_size: 5,
            threshold_mode: ThresholdMode::Adaptive,
            binary_threshold: 127,
            adaptive_method: AdaptiveMethod::Gaussian,
            adaptive_block_size: 11,
            adaptive_offset: 2,
            canny_low_threshold: 50.0,
            canny_high_threshold: 150.0,
            max_dimension: 1200,
            default_canvas_width: 1440,
            default_canvas_height: 900,
            max_background_ratio: 0.95,
            approx_epsilon_ratio: 0.02,
            min_vertices: 3,
            max_vertices: 8,
        }
    }
}

impl VisionConfig {
    /// Reads a JSON config file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> VisionResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| VisionError::Config(format!("{}: {err}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|err| VisionError::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `SKETCHFRAME_*` overrides on top of the current values.
    pub fn with_env_overrides(mut self) -> VisionResult<Self> {
        if let Some(value) = env_value("SKETCHFRAME_MIN_CONTOUR_AREA") {
            self.min_contour_area = value
                .parse()
                .map_err(|_| VisionError::Config(format!("SKETCHFRAME_MIN_CONTOUR_AREA={value}")))?;
        }
        if let Some(value) = env_value("SKETCHFRAME_BLUR_KERNEL") {
            self.blur_kernel_size = value
                .parse()
                .map_err(|_| VisionError::Config(format!("SKETCHFRAME_BLUR_KERNEL={value}")))?;
        }
        if let Some(value) = env_value("SKETCHFRAME_MAX_DIMENSION") {
            self.max_dimension = value
                .parse()
                .map_err(|_| VisionError::Config(format!("SKETCHFRAME_MAX_DIMENSION={value}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> VisionResult<()> {
        if self.default_canvas_width == 0 || self.default_canvas_height == 0 {
            return Err(VisionError::Config(
                "default canvas size must be non-zero".to_string(),
            ));
        }
        if self.max_dimension == 0 {
            return Err(VisionError::Config("max_dimension must be non-zero".to_string()));
        }
        if self.canny_low_threshold > self.canny_high_threshold {
            return Err(VisionError::Config(format!(
                "canny_low_threshold ({}) exceeds canny_high_threshold ({})",
                self.canny_low_threshold, self.canny_high_threshold
            )));
        }
        if !(self.max_background_ratio > 0.0 && self.max_background_ratio <= 1.0) {
            return Err(VisionError::Config(format!(
                "max_background_ratio must be in (0, 1], got {}",
                self.max_background_ratio
            )));
        }
        if self.min_vertices > self.max_vertices {
            return Err(VisionError::Config(format!(
                "min_vertices ({}) exceeds max_vertices ({})",
                self.min_vertices, self.max_vertices
            )));
        }
        Ok(())
    }

    pub fn blur_kernel(&self) -> u32 {
        force_odd(self.blur_kernel_size)
    }

    pub fn adaptive_block(&self) -> u32 {
        force_odd(self.adaptive_block_size.max(3))
    }

    pub fn default_canvas(&self) -> (u32, u32) {
        (self.default_canvas_width, self.default_canvas_height)
    }
}

pub fn force_odd(size: u32) -> u32 {
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

pub fn device_canvas(name: &str) -> (u32, u32) {
    let lookup = |key: &str| {
        DEVICE_CANVAS_SIZES
            .iter()
            .find(|(device, _, _)| device.eq_ignore_ascii_case(key))
            .map(|(_, w, h)| (*w, *h))
    };
    lookup(name.trim())
        .or_else(|| lookup(DEFAULT_DEVICE))
        .unwrap_or((1440, 900))
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
