use crate::classify::ComponentType;
use crate::contours::DetectedShape;
use crate::error::{ensure_non_empty, VisionError, VisionResult};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_LAYOUT_NAME: &str = "Sketch Wireframe";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentSource {
    Cv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub position: Position,
    pub size: Size,
    pub props: Map<String, Value>,
    pub children: Vec<String>,
    pub detected_text: Option<String>,
    pub confidence: f64,
    pub source: ComponentSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    pub component_count: usize,
    pub type_counts: BTreeMap<ComponentType, usize>,
    pub processing_notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: String,
    pub name: String,
    pub canvas_size: Size,
    pub background_color: String,
    pub source_type: String,
    pub created_at: String,
    pub components: Vec<Component>,
    pub metadata: LayoutMetadata,
}

impl Layout {
    pub fn new(name: &str, canvas: (u32, u32), components: Vec<Component>, notes: Vec<String>) -> Self {
        let metadata = LayoutMetadata {
            component_count: components.len(),
            type_counts: type_counts(&components),
            processing_notes: notes,
        };
        Self {
            id: new_layout_id(),
            name: name.to_string(),
            canvas_size: Size {
                width: f64::from(canvas.0),
                height: f64::from(canvas.1),
            },
            background_color: "#ffffff".to_string(),
            source_type: "sketch".to_string(),
            created_at: Utc::now().to_rfc3339(),
            components,
            metadata,
        }
    }
}

/// A detected shape paired with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedShape {
    pub shape: DetectedShape,
    pub kind: ComponentType,
    pub confidence: f64,
}

/// Placeholder content per component type.
pub fn default_props(kind: ComponentType) -> Map<String, Value> {
    let value = match kind {
        ComponentType::Navbar => json!({"logo": "Logo", "links": ["Home", "About", "Contact"]}),
        ComponentType::Hero => json!({
            "headline": "Your Headline Here",
            "subheadline": "Supporting text goes here",
            "cta": "Get Started"
        }),
        ComponentType::Section => json!({"title": "Section Title", "content": "Section content..."}),
        ComponentType::Card => json!({"title": "Card Title", "description": "Card description"}),
        ComponentType::Button => json!({"text": "Button", "variant": "primary"}),
        ComponentType::Footer => json!({"links": ["Privacy", "Terms", "Contact"], "copyright": "© 2024"}),
        ComponentType::Sidebar => json!({"items": ["Dashboard", "Settings", "Help"]}),
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Rescales image-space boxes onto the canvas and attaches default props.
///
/// The x and y factors are independent, so aspect ratio is not preserved
/// when the photo and the canvas have different proportions.
pub fn assemble_components(
    shapes: &[ClassifiedShape],
    image_width: u32,
    image_height: u32,
    canvas: (u32, u32),
) -> VisionResult<Vec<Component>> {
    ensure_non_empty("assemble", image_width, image_height)?;
    if canvas.0 == 0 || canvas.1 == 0 {
        return Err(VisionError::Config(format!(
            "canvas size must be non-zero, got {}x{}",
            canvas.0, canvas.1
        )));
    }
    let scale_x = f64::from(canvas.0) / f64::from(image_width);
    let scale_y = f64::from(canvas.1) / f64::from(image_height);

    let components = shapes
        .iter()
        .enumerate()
        .map(|(idx, item)| Component {
            id: format!("component-{}", idx + 1),
            kind: item.kind,
            position: Position {
                x: f64::from(item.shape.x) * scale_x,
                y: f64::from(item.shape.y) * scale_y,
            },
            size: Size {
                width: f64::from(item.shape.width) * scale_x,
                height: f64::from(item.shape.height) * scale_y,
            },
            props: default_props(item.kind),
            children: Vec::new(),
            detected_text: None,
            confidence: item.confidence.clamp(0.0, 1.0),
            source: ComponentSource::Cv,
        })
        .collect();
    Ok(components)
}

pub fn type_counts(components: &[Component]) -> BTreeMap<ComponentType, usize> {
    let mut counts = BTreeMap::new();
    for component in components {
        *counts.entry(component.kind).or_insert(0) += 1;
    }
    counts
}

/// Human-readable diagnostics; never used for anything but logging/output.
pub fn processing_notes(
    original_size: (u32, u32),
    scale: f64,
    components: &[Component],
) -> Vec<String> {
    let mut notes = vec![format!("Original size: {}x{}", original_size.0, original_size.1)];
    if scale != 1.0 {
        notes.push(format!("Resized by factor {scale:.2}"));
    }
    notes.push(format!("Detected {} components", components.len()));
    let counts = type_counts(components)
        .iter()
        .map(|(kind, count)| format!("{kind}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    notes.push(format!("Types: {{{counts}}}"));
    notes
}

fn new_layout_id() -> String {
    let ts = Utc::now().format("%Y%m%d-%H%M%S");
    let suffix = rand::thread_rng().gen_range(1000..9999);
    format!("sketch-{ts}-{suffix}")
}
