use crate::classify::classify_shape;
use crate::config::VisionConfig;
use crate::contours::extract_shapes;
use crate::decode::{decode_base64_image, encode_image_to_base64};
use crate::error::{ensure_non_empty, VisionError, VisionResult};
use crate::layout::{
    assemble_components, processing_notes, ClassifiedShape, Layout, DEFAULT_LAYOUT_NAME,
};
use crate::overlay::render_debug_overlay;
use crate::preprocess::preprocess_image;
use crate::scale::resize_for_processing;
use image::{imageops, DynamicImage, GrayImage, RgbImage};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Optional OCR collaborator. Receives the crop of each detected component
/// from the processed raster.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, crop: &RgbImage) -> Option<String>;
}

pub struct AnalyzeOptions<'a> {
    pub return_debug_overlay: bool,
    /// Falls back to the configured default canvas when unset.
    pub target_canvas: Option<(u32, u32)>,
    pub name: String,
    pub text_recognizer: Option<&'a dyn TextRecognizer>,
}

impl Default for AnalyzeOptions<'_> {
    fn default() -> Self {
        Self {
            return_debug_overlay: false,
            target_canvas: None,
            name: DEFAULT_LAYOUT_NAME.to_string(),
            text_recognizer: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SketchAnalysis {
    pub layout: Layout,
    pub debug_overlay_image: Option<String>,
    pub original_size: Dimensions,
    pub processing_notes: Vec<String>,
    pub scale_factor: f64,
    #[serde(skip)]
    pub edges: GrayImage,
}

/// Decodes a base64 sketch photo and runs the full pipeline on it.
pub fn analyze_sketch(
    encoded_image: &str,
    options: &AnalyzeOptions<'_>,
    config: &VisionConfig,
) -> VisionResult<SketchAnalysis> {
    let image = decode_base64_image(encoded_image)?;
    analyze_image(&image, options, config)
}

/// Layout JSON only, without the debug overlay.
pub fn analyze_sketch_simple(encoded_image: &str, config: &VisionConfig) -> VisionResult<Value> {
    let analysis = analyze_sketch(encoded_image, &AnalyzeOptions::default(), config)?;
    serde_json::to_value(&analysis.layout).map_err(|err| VisionError::Encode(err.to_string()))
}

/// Pipeline on an already decoded raster.
pub fn analyze_image(
    image: &RgbImage,
    options: &AnalyzeOptions<'_>,
    config: &VisionConfig,
) -> VisionResult<SketchAnalysis> {
    let original_size = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    ensure_non_empty("analyze", original_size.width, original_size.height)?;

    let (processed, scale_factor) = resize_for_processing(image, config.max_dimension)?;
    let (img_w, img_h) = processed.dimensions();
    let processed = DynamicImage::ImageRgb8(processed);

    let (binary, edges) = preprocess_image(&processed, config)?;
    let shapes = extract_shapes(&binary, config)?;

    let classified = shapes
        .into_iter()
        .map(|shape| {
            let (kind, confidence) = classify_shape(&shape, img_w, img_h)?;
            debug!(
                x = shape.x,
                y = shape.y,
                width = shape.width,
                height = shape.height,
                %kind,
                confidence,
                "classified shape"
            );
            Ok(ClassifiedShape {
                shape,
                kind,
                confidence,
            })
        })
        .collect::<VisionResult<Vec<_>>>()?;

    let canvas = options.target_canvas.unwrap_or_else(|| config.default_canvas());
    let mut components = assemble_components(&classified, img_w, img_h, canvas)?;

    let rgb = processed.as_rgb8();
    if let (Some(recognizer), Some(rgb)) = (options.text_recognizer, rgb) {
        for (component, item) in components.iter_mut().zip(&classified) {
            let s = &item.shape;
            let crop = imageops::crop_imm(rgb, s.x, s.y, s.width, s.height).to_image();
            component.detected_text = recognizer.recognize(&crop);
        }
    }

    let notes = processing_notes(
        (original_size.width, original_size.height),
        scale_factor,
        &components,
    );
    if components.is_empty() {
        warn!(
            width = original_size.width,
            height = original_size.height,
            "no components detected in sketch"
        );
    }
    info!(
        components = components.len(),
        scale_factor,
        canvas_width = canvas.0,
        canvas_height = canvas.1,
        "analyzed sketch"
    );

    let debug_overlay_image = match (options.return_debug_overlay, rgb) {
        (true, Some(rgb)) => {
            let overlay = render_debug_overlay(rgb, &classified);
            Some(encode_image_to_base64(&DynamicImage::ImageRgba8(overlay))?)
        }
        _ => None,
    };

    let layout = Layout::new(&options.name, canvas, components, notes.clone());
    Ok(SketchAnalysis {
        layout,
        debug_overlay_image,
        original_size,
        processing_notes: notes,
        scale_factor,
        edges,
    })
}
