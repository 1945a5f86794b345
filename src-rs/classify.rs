use crate::contours::DetectedShape;
use crate::error::{ensure_non_empty, VisionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Navbar,
    Hero,
    Footer,
    Sidebar,
    Card,
    Button,
    Section,
}

impl ComponentType {
    pub const ALL: [Self; 7] = [
        Self::Navbar,
        Self::Hero,
        Self::Footer,
        Self::Sidebar,
        Self::Card,
        Self::Button,
        Self::Section,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navbar => "navbar",
            Self::Hero => "hero",
            Self::Footer => "footer",
            Self::Sidebar => "sidebar",
            Self::Card => "card",
            Self::Button => "button",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and size of a shape relative to the whole image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeRatios {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub aspect: f64,
}

impl ShapeRatios {
    pub fn new(shape: &DetectedShape, image_width: u32, image_height: u32) -> VisionResult<Self> {
        ensure_non_empty("classify", image_width, image_height)?;
        let (iw, ih) = (f64::from(image_width), f64::from(image_height));
        Ok(Self {
            x: f64::from(shape.x) / iw,
            y: f64::from(shape.y) / ih,
            width: f64::from(shape.width) / iw,
            height: f64::from(shape.height) / ih,
            area: shape.area / (iw * ih),
            aspect: shape.aspect_ratio(),
        })
    }
}

pub struct Rule {
    pub component: ComponentType,
    pub confidence: f64,
    pub matches: fn(&ShapeRatios) -> bool,
}

pub const FALLBACK: (ComponentType, f64) = (ComponentType::Section, 0.5);

/// First match wins. Edge-anchored roles come before size-based ones so a
/// large shape touching an edge is named for its structural role.
pub const RULES: [Rule; 6] = [
    Rule {
        component: ComponentType::Navbar,
        confidence: 0.9,
        matches: |r| r.y < 0.12 && r.width > 0.7 && r.height < 0.15,
    },
    Rule {
        component: ComponentType::Footer,
        confidence: 0.85,
        matches: |r| r.y + r.height > 0.85 && r.width > 0.7,
    },
    Rule {
        component: ComponentType::Sidebar,
        confidence: 0.85,
        matches: |r| r.x < 0.3 && r.height > 0.5 && r.width < 0.35,
    },
    Rule {
        component: ComponentType::Hero,
        confidence: 0.8,
        matches: |r| r.y < 0.35 && r.area > 0.15,
    },
    Rule {
        component: ComponentType::Button,
        confidence: 0.7,
        matches: |r| r.area < 0.03 && r.aspect > 1.5 && r.aspect < 6.0,
    },
    Rule {
        component: ComponentType::Card,
        confidence: 0.7,
        matches: |r| r.area < 0.15 && r.aspect > 0.5 && r.aspect < 2.0,
    },
];

pub fn classify_ratios(ratios: &ShapeRatios) -> (ComponentType, f64) {
    RULES
        .iter()
        .find(|rule| (rule.matches)(ratios))
        .map(|rule| (rule.component, rule.confidence))
        .unwrap_or(FALLBACK)
}

pub fn classify_shape(
    shape: &DetectedShape,
    image_width: u32,
    image_height: u32,
) -> VisionResult<(ComponentType, f64)> {
    let ratios = ShapeRatios::new(shape, image_width, image_height)?;
    Ok(classify_ratios(&ratios))
}
