//! Text layout inside a grid cell.
//!
//! Lines are measured with the real font (advances plus kerning), wrapped
//! greedily at whitespace to the cell width, centred on both axes within
//! the cell and finally shifted so the block stays inside the image.
//! A single word wider than the cell is kept whole on its own line, and a
//! blank line between paragraphs is kept as an empty line.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};

use crate::grid::{clamp_to_bounds, CellRect};

/// One laid-out line. Coordinates are absolute image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    pub width: f32,
    /// Left edge of the line's pen position.
    pub x: f32,
    pub baseline_y: f32,
}

/// Positioned text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub scale: PxScale,
    pub lines: Vec<LayoutLine>,
    /// Top-left corner of the block.
    pub origin: (f32, f32),
    pub block_width: f32,
    pub block_height: f32,
}

/// Pixel width of `text` on a single line.
pub fn measure_line(font: &FontArc, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
    width
}

/// Greedy wrap. Explicit newlines always break and blank lines inside the
/// text stay as empty lines; runs of other whitespace collapse to one
/// space. Returns each line with its measured width.
pub fn wrap(font: &FontArc, scale: PxScale, text: &str, max_width: f32) -> Vec<(String, f32)> {
    let mut lines = Vec::new();

    for paragraph in text.trim().lines() {
        if paragraph.trim().is_empty() {
            lines.push((String::new(), 0.0));
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0f32;

        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                current_width = measure_line(font, scale, &current);
                continue;
            }

            let candidate = format!("{} {}", current, word);
            let candidate_width = measure_line(font, scale, &candidate);
            if candidate_width <= max_width {
                current = candidate;
                current_width = candidate_width;
            } else {
                lines.push((std::mem::take(&mut current), current_width));
                current.push_str(word);
                current_width = measure_line(font, scale, &current);
            }
        }

        if !current.is_empty() {
            lines.push((current, current_width));
        }
    }

    lines
}

/// Lay out `text` at `font_size` centred in `cell` of a `width` x `height`
/// image.
pub fn layout(
    font: &FontArc,
    font_size: f32,
    text: &str,
    cell: &CellRect,
    width: u32,
    height: u32,
) -> TextLayout {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let line_height = scaled.height();
    let line_advance = line_height + scaled.line_gap();

    let wrapped = wrap(font, scale, text, cell.width as f32);
    let block_width = wrapped.iter().map(|(_, w)| *w).fold(0.0f32, f32::max);
    let block_height = if wrapped.is_empty() {
        0.0
    } else {
        line_height + (wrapped.len() - 1) as f32 * line_advance
    };

    let centred_x = cell.x as f32 + (cell.width as f32 - block_width) / 2.0;
    let centred_y = cell.y as f32 + (cell.height as f32 - block_height) / 2.0;
    let (x, y) = clamp_to_bounds(centred_x, centred_y, block_width, block_height, width, height);
    // Whole-pixel origin keeps glyph rasterization stable across positions
    let origin = (x.round(), y.round());

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, (text, line_width))| LayoutLine {
            x: origin.0 + ((block_width - line_width) / 2.0).round(),
            baseline_y: origin.1 + scaled.ascent() + i as f32 * line_advance,
            width: line_width,
            text,
        })
        .collect();

    TextLayout {
        scale,
        lines,
        origin,
        block_width,
        block_height,
    }
}
