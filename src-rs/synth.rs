//! Synthetic hand-drawn style sketch: navbar, hero, a row of three cards and
//! a footer, outlined in black on white paper with a label inside each box.

use crate::overlay::draw_bitmap_text;
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

pub const STROKE: u32 = 3;
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A labelled box as `(label, [x0, y0, x1, y1])`, corners inclusive.
pub type SketchBox = (&'static str, [u32; 4]);

pub fn sketch_boxes(width: u32, height: u32) -> Vec<SketchBox> {
    let right = width.saturating_sub(10);
    let card_width = width.saturating_sub(60) / 3;
    let card_y = height * 280 / 600;
    let card_height = height / 4;

    let mut boxes = vec![
        ("NAVBAR", [10, 10, right, height / 10]),
        ("HERO", [10, height * 80 / 600, right, height * 250 / 600]),
    ];
    for (i, label) in ["CARD 1", "CARD 2", "CARD 3"].into_iter().enumerate() {
        let x = 20 + i as u32 * (card_width + 10);
        boxes.push((
            label,
            [x, card_y, x + card_width.saturating_sub(10), card_y + card_height],
        ));
    }
    boxes.push((
        "FOOTER",
        [10, height.saturating_sub(60), right, height.saturating_sub(10)],
    ));
    boxes
}

pub fn render_sketch(width: u32, height: u32) -> RgbImage {
    render_boxes(width, height, &sketch_boxes(width, height))
}

/// Draws arbitrary labelled boxes on blank paper.
pub fn render_boxes(width: u32, height: u32, boxes: &[SketchBox]) -> RgbImage {
    let mut canvas = RgbaImage::from_pixel(width, height, PAPER);
    for &(label, [x0, y0, x1, y1]) in boxes {
        stroke_rect(&mut canvas, x0, y0, x1, y1);
        let text_y = ((y0 + y1) / 2).saturating_sub(4);
        draw_bitmap_text(&mut canvas, x0 as i32 + 12, text_y as i32, label, INK, 1);
    }
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Outline centred on the given edges, `STROKE` pixels wide.
fn stroke_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) {
    let half = STROKE / 2;
    let max_x = img.width().saturating_sub(1);
    let max_y = img.height().saturating_sub(1);
    let mut band = |bx0: u32, by0: u32, bx1: u32, by1: u32| {
        for y in by0.min(max_y)..=by1.min(max_y) {
            for x in bx0.min(max_x)..=bx1.min(max_x) {
                img.put_pixel(x, y, INK);
            }
        }
    };
    let (ox0, oy0) = (x0.saturating_sub(half), y0.saturating_sub(half));
    let (ox1, oy1) = (x1 + half, y1 + half);
    band(ox0, oy0, ox1, y0 + half);
    band(ox0, y1.saturating_sub(half), ox1, oy1);
    band(ox0, oy0, x0 + half, oy1);
    band(x1.saturating_sub(half), oy0, ox1, oy1);
}
