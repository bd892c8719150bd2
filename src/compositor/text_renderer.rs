//! Glyph rasterization into a coverage mask.
//!
//! The mask has the size of the target image; each byte is the glyph
//! coverage of that pixel (255 = fully inside a glyph). Colour, opacity and
//! blending are applied later, so the same mask feeds both the shadow and
//! the text pass.

use ab_glyph::{point, Font, FontArc, ScaleFont};
use image::{GrayImage, Luma};

use super::layout::TextLayout;

/// Rasterize every line of `layout` into a `width` x `height` mask.
pub fn render_mask(font: &FontArc, layout: &TextLayout, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let scaled = font.as_scaled(layout.scale);

    for line in &layout.lines {
        let mut cursor_x = line.x;
        let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

        for c in line.text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(prev) = prev_glyph {
                cursor_x += scaled.kern(prev, glyph_id);
            }

            let glyph =
                glyph_id.with_scale_and_position(layout.scale, point(cursor_x, line.baseline_y));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = px as i64 + bounds.min.x as i64;
                    let y = py as i64 + bounds.min.y as i64;
                    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                        return;
                    }
                    let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                    let pixel = mask.get_pixel_mut(x as u32, y as u32);
                    // Overlapping glyphs keep the stronger coverage
                    if value > pixel.0[0] {
                        *pixel = Luma([value]);
                    }
                });
            }

            cursor_x += scaled.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }
    }

    mask
}
