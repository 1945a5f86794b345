use crate::classify::ComponentType;
use crate::layout::ClassifiedShape;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbImage, RgbaImage};

const GLYPH: i32 = 8;
const OUTLINE_THICKNESS: u32 = 2;

pub fn component_color(kind: ComponentType) -> Rgba<u8> {
    match kind {
        ComponentType::Navbar => Rgba([0, 0, 255, 255]),
        ComponentType::Hero => Rgba([0, 255, 0, 255]),
        ComponentType::Footer => Rgba([255, 0, 0, 255]),
        ComponentType::Sidebar => Rgba([0, 255, 255, 255]),
        ComponentType::Card => Rgba([255, 0, 255, 255]),
        ComponentType::Button => Rgba([255, 255, 0, 255]),
        ComponentType::Section => Rgba([128, 128, 128, 255]),
    }
}

pub fn overlay_label(kind: ComponentType, confidence: f64) -> String {
    format!("{kind} ({:.0}%)", confidence * 100.0)
}

/// Draws each shape's box and `"<type> (<confidence%>)"` label over the
/// processed raster.
pub fn render_debug_overlay(base: &RgbImage, shapes: &[ClassifiedShape]) -> RgbaImage {
    let mut out = RgbaImage::from_fn(base.width(), base.height(), |x, y| {
        let [r, g, b] = base.get_pixel(x, y).0;
        Rgba([r, g, b, 255])
    });

    for item in shapes {
        let color = component_color(item.kind);
        let s = &item.shape;
        draw_rect_outline(&mut out, s.x, s.y, s.width, s.height, color, OUTLINE_THICKNESS);

        let label = overlay_label(item.kind, item.confidence);
        let above = s.y as i32 - GLYPH - 4;
        let label_y = if above >= 0 { above } else { s.y as i32 + 4 };
        let (x0, y0, x1, y1) = text_bbox(s.x as i32, label_y, &label, 1);
        fill_rect_alpha(&mut out, x0 - 1, y0 - 1, x1, y1, Rgba([255, 255, 255, 170]));
        draw_bitmap_text(&mut out, s.x as i32, label_y, &label, color, 1);
    }
    out
}

pub fn draw_rect_outline(
    img: &mut RgbaImage,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    color: Rgba<u8>,
    thickness: u32,
) {
    if w == 0 || h == 0 || img.width() == 0 || img.height() == 0 {
        return;
    }
    let img_w = img.width();
    let img_h = img.height();

    let x0 = x.min(img_w - 1);
    let y0 = y.min(img_h - 1);
    let x1 = (x + w - 1).min(img_w - 1);
    let y1 = (y + h - 1).min(img_h - 1);

    // grows inward so boxes on the frame stay visible
    for t in 0..thickness.max(1) {
        let tx0 = (x0 + t).min(x1);
        let ty0 = (y0 + t).min(y1);
        let tx1 = x1.saturating_sub(t).max(tx0);
        let ty1 = y1.saturating_sub(t).max(ty0);
        for xx in tx0..=tx1 {
            img.put_pixel(xx, ty0, color);
            img.put_pixel(xx, ty1, color);
        }
        for yy in ty0..=ty1 {
            img.put_pixel(tx0, yy, color);
            img.put_pixel(tx1, yy, color);
        }
    }
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| (f64::from(d) * inv + f64::from(s) * a).round().clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), dst[3]])
}

fn fill_rect_alpha(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    let max_x = img.width() as i32 - 1;
    let max_y = img.height() as i32 - 1;
    for y in y0.min(y1).clamp(0, max_y)..=y0.max(y1).clamp(0, max_y) {
        for x in x0.min(x1).clamp(0, max_x)..=x0.max(x1).clamp(0, max_x) {
            let dst = *img.get_pixel(x as u32, y as u32);
            img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
        }
    }
}

pub fn draw_bitmap_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let scale_i = scale.max(1) as i32;
    let mut cursor_x = x;
    for ch in text.chars() {
        let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
        let Some(glyph) = glyph else {
            cursor_x += GLYPH * scale_i;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..GLYPH {
                if (*row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale_i;
                let py = y + row_idx as i32 * scale_i;
                for sy in 0..scale_i {
                    for sx in 0..scale_i {
                        let (tx, ty) = (px + sx, py + sy);
                        if tx >= 0 && ty >= 0 && tx < img.width() as i32 && ty < img.height() as i32 {
                            let dst = *img.get_pixel(tx as u32, ty as u32);
                            img.put_pixel(tx as u32, ty as u32, blend_pixel(dst, color));
                        }
                    }
                }
            }
        }
        cursor_x += GLYPH * scale_i;
    }
}

fn text_bbox(x: i32, y: i32, text: &str, scale: u32) -> (i32, i32, i32, i32) {
    let scale_i = scale.max(1) as i32;
    let chars = text.chars().count() as i32;
    (x, y, x + chars * GLYPH * scale_i, y + GLYPH * scale_i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contours::DetectedShape;
    use image::Rgb;

    fn item(x: u32, y: u32, w: u32, h: u32, kind: ComponentType, confidence: f64) -> ClassifiedShape {
        ClassifiedShape {
            shape: DetectedShape {
                x,
                y,
                width: w,
                height: h,
                area: f64::from(w * h),
                contour: Vec::new(),
            },
            kind,
            confidence,
        }
    }

    #[test]
    fn label_formats_percent() {
        assert_eq!(overlay_label(ComponentType::Navbar, 0.9), "navbar (90%)");
        assert_eq!(overlay_label(ComponentType::Section, 0.5), "section (50%)");
    }

    #[test]
    fn colors_are_fixed_per_type() {
        assert_eq!(component_color(ComponentType::Navbar), Rgba([0, 0, 255, 255]));
        assert_eq!(component_color(ComponentType::Footer), Rgba([255, 0, 0, 255]));
        assert_eq!(component_color(ComponentType::Button), Rgba([255, 255, 0, 255]));
    }

    #[test]
    fn overlay_outlines_shapes_in_type_color() {
        let base = RgbImage::from_pixel(200, 120, Rgb([255, 255, 255]));
        let shapes = vec![item(20, 40, 100, 50, ComponentType::Card, 0.7)];
        let out = render_debug_overlay(&base, &shapes);
        assert_eq!(out.dimensions(), (200, 120));
        let magenta = component_color(ComponentType::Card);
        assert_eq!(*out.get_pixel(60, 89), magenta);
        assert_eq!(*out.get_pixel(119, 70), magenta);
        assert_eq!(*out.get_pixel(180, 110), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn labels_near_top_edge_move_inside_box() {
        let base = RgbImage::from_pixel(200, 120, Rgb([255, 255, 255]));
        let shapes = vec![item(0, 0, 190, 30, ComponentType::Navbar, 0.9)];
        let out = render_debug_overlay(&base, &shapes);
        let blue = component_color(ComponentType::Navbar);
        let text_pixels = (4..12)
            .flat_map(|y| (2..100).map(move |x| (x, y)))
            .filter(|&(x, y)| *out.get_pixel(x, y) == blue)
            .count();
        assert!(text_pixels > 0);
    }

    #[test]
    fn rect_outline_clips_to_image() {
        let mut img = RgbaImage::new(10, 10);
        let red = Rgba([255, 0, 0, 255]);
        draw_rect_outline(&mut img, 5, 5, 50, 50, red, 2);
        assert_eq!(*img.get_pixel(9, 9), red);
        assert_eq!(*img.get_pixel(5, 5), red);
        assert_eq!(*img.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
    }
}
