//! Mask-driven blending of a flat colour onto an RGBA canvas.
//!
//! All arithmetic is on integers; a pixel whose effective alpha is 255
//! under [`BlendMode::Normal`] takes the colour exactly.

use image::{GrayImage, RgbaImage};
use rayon::prelude::*;

use crate::color::Color;
use crate::style::BlendMode;

/// Opacity in [0, 1] as an 8-bit alpha.
pub fn opacity_to_alpha(opacity: f32) -> u32 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u32
}

/// Blend `color` into `canvas` wherever `mask` has coverage.
///
/// Effective alpha per pixel is `mask * opacity`. Canvas and mask must
/// have the same dimensions.
pub fn composite(
    canvas: &mut RgbaImage,
    mask: &GrayImage,
    color: Color,
    opacity: f32,
    mode: BlendMode,
) {
    debug_assert_eq!(canvas.dimensions(), mask.dimensions());
    let width = canvas.width() as usize;
    if width == 0 {
        return;
    }
    let opacity = opacity_to_alpha(opacity);
    let fg = color.channels();

    canvas
        .par_chunks_mut(width * 4)
        .zip(mask.par_chunks(width))
        .for_each(|(row, coverage)| {
            for (px, &m) in row.chunks_exact_mut(4).zip(coverage) {
                if m == 0 {
                    continue;
                }
                let alpha = div255(m as u32 * opacity);
                if alpha == 0 {
                    continue;
                }
                for c in 0..3 {
                    let bg = px[c] as u32;
                    let target = match mode {
                        BlendMode::Normal => fg[c] as u32,
                        BlendMode::Overlay => overlay_channel(bg, fg[c] as u32),
                    };
                    px[c] = lerp(bg, target, alpha) as u8;
                }
                let dst_alpha = px[3] as u32;
                px[3] = (dst_alpha + div255(alpha * (255 - dst_alpha))) as u8;
            }
        });
}

/// Overlay of `top` onto `base`, both 0..=255.
///
/// `2 * b * s` for dark bases, `1 - 2 * (1 - b) * (1 - s)` for light ones.
pub fn overlay_channel(base: u32, top: u32) -> u32 {
    if base < 128 {
        div255(2 * base * top)
    } else {
        255 - div255(2 * (255 - base) * (255 - top))
    }
}

fn lerp(bg: u32, fg: u32, alpha: u32) -> u32 {
    div255(fg * alpha + bg * (255 - alpha))
}

/// Rounded division by 255.
fn div255(v: u32) -> u32 {
    (v + 127) / 255
}
