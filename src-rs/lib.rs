//! Turns photos of hand-drawn UI sketches into typed wireframe components
//! positioned on a target canvas.
//!
//! Stages run in order: base64 decode, downscale, binarize, contour
//! extraction, rule-based classification, canvas assembly, and an optional
//! debug overlay. [`analyze_sketch`] drives all of them.

pub mod classify;
pub mod config;
pub mod contours;
pub mod decode;
pub mod error;
pub mod layout;
pub mod overlay;
pub mod pipeline;
pub mod preprocess;
pub mod scale;
pub mod synth;

pub use classify::ComponentType;
pub use config::{device_canvas, ThresholdMode, VisionConfig};
pub use error::{DecodeError, VisionError, VisionResult};
pub use layout::{Component, Layout};
pub use pipeline::{
    analyze_image, analyze_sketch, analyze_sketch_simple, AnalyzeOptions, SketchAnalysis,
    TextRecognizer,
};
