//! Text compositor.
//!
//! Renders a caption into one grid cell of an image.
//!
//! # Pipeline
//!
//! 1. Validate text and style (`InvalidInput` / `InvalidStyle`)
//! 2. Resolve the font face (`RenderFailure` if it cannot be loaded)
//! 3. Lay the text out in the cell ([`layout`])
//! 4. Rasterize glyph coverage into a mask ([`text_renderer`])
//! 5. Optionally composite a blurred, offset shadow ([`shadow`])
//! 6. Composite the text with the style's blend mode ([`blend`])
//!
//! The input image is never modified; every render allocates a new canvas.
//! Identical inputs always produce identical pixels.

pub mod blend;
pub mod fonts;
pub mod layout;
pub mod shadow;
pub mod text_renderer;

use image::{DynamicImage, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::time::Instant;

use crate::error::OverlayError;
use crate::grid::{cell_rect, Position};
use crate::style::{BlendMode, StyleConfig};

pub use fonts::{FontFace, FontRegistry};
pub use shadow::ShadowConfig;

/// Output raster of a render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pixels: RgbaImage,
}

impl RenderedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    pub fn into_dynamic(self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.pixels)
    }

    /// SHA-256 over dimensions and pixel data, hex encoded.
    ///
    /// Equal fingerprints mean pixel-identical renders, so this can key a
    /// render cache.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width().to_be_bytes());
        hasher.update(self.height().to_be_bytes());
        hasher.update(self.pixels.as_raw());
        hex::encode(hasher.finalize())
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, OverlayError> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder as _;

        let mut output = Cursor::new(Vec::new());
        PngEncoder::new(&mut output)
            .write_image(
                self.pixels.as_raw(),
                self.width(),
                self.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| OverlayError::render_failure(format!("PNG encoding failed: {}", e)))?;
        Ok(output.into_inner())
    }
}

/// Draws captions with a fixed font registry and shadow settings.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    fonts: FontRegistry,
    shadow: ShadowConfig,
}

impl Compositor {
    pub fn new(fonts: FontRegistry, shadow: ShadowConfig) -> Self {
        Self { fonts, shadow }
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn shadow(&self) -> &ShadowConfig {
        &self.shadow
    }

    /// Render `text` into the `position` cell of `image`.
    pub fn render(
        &self,
        image: &DynamicImage,
        text: &str,
        position: Position,
        style: &StyleConfig,
    ) -> Result<RenderedImage, OverlayError> {
        let started = Instant::now();
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(OverlayError::invalid_input(format!(
                "Image has zero dimension ({}x{})",
                width, height
            )));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(OverlayError::invalid_input("Text is empty"));
        }

        let color = style.validate(&self.fonts)?;
        let font = self.fonts.resolve(&style.font_family)?;

        let cell = cell_rect(position, width, height);
        let layout = layout::layout(&font, style.font_size as f32, text, &cell, width, height);
        let mask = text_renderer::render_mask(&font, &layout, width, height);

        let mut canvas = image.to_rgba8();
        if style.shadow {
            let shadow_mask = shadow::cast(&mask, &self.shadow);
            blend::composite(
                &mut canvas,
                &shadow_mask,
                color.darken(self.shadow.tone),
                style.opacity * self.shadow.strength,
                BlendMode::Normal,
            );
        }
        blend::composite(&mut canvas, &mask, color, style.opacity, style.blend_mode);

        tracing::debug!(
            width = width,
            height = height,
            position = %position,
            font_family = %style.font_family,
            font_size = style.font_size,
            blend_mode = %style.blend_mode,
            lines = layout.lines.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Text rendered"
        );

        Ok(RenderedImage::new(canvas))
    }
}
