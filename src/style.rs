//! Style configuration for the compositor.
//!
//! Serialized shape (JSON/YAML):
//!
//! ```yaml
//! font_family: OpenSans-Regular
//! font_size: 32
//! text_color: white
//! opacity: 0.9
//! blend_mode: overlay
//! shadow: true
//! ```
//!
//! Every field has a default so partial documents deserialize. Range checks
//! are never applied by clamping; [`StyleConfig::validate`] rejects instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::{parse_color, Color};
use crate::compositor::fonts::{FontRegistry, DEFAULT_FONT_FAMILY};
use crate::error::OverlayError;

pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 72;
pub const MIN_OPACITY: f32 = 0.1;
pub const MAX_OPACITY: f32 = 1.0;

/// Text colour keyword meaning "pick a contrasting palette colour".
pub const AUTO_COLOR: &str = "auto";

// Default values
fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_font_size() -> u32 {
    32
}

fn default_text_color() -> String {
    "white".to_string()
}

fn default_opacity() -> f32 {
    0.9
}

fn default_shadow() -> bool {
    true
}

/// How the text layer combines with the image underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Straight alpha composite.
    Normal,
    /// Per-channel overlay formula.
    #[default]
    Overlay,
}

impl BlendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Overlay => "overlay",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "overlay" => Ok(Self::Overlay),
            other => Err(OverlayError::invalid_style(format!(
                "Unknown blend mode '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Family name from the font registry (default: "OpenSans-Regular")
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font size in pixels, 12-72 (default: 32)
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Palette name, "#RRGGBB", "rgb(r, g, b)" or "auto" (default: "white")
    #[serde(default = "default_text_color")]
    pub text_color: String,

    /// Opacity from 0.1 to 1.0 (default: 0.9)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Blend mode (default: overlay)
    #[serde(default)]
    pub blend_mode: BlendMode,

    /// Drop shadow under the text (default: true)
    #[serde(default = "default_shadow")]
    pub shadow: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            text_color: default_text_color(),
            opacity: default_opacity(),
            blend_mode: BlendMode::default(),
            shadow: default_shadow(),
        }
    }
}

impl StyleConfig {
    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_text_color(mut self, text_color: impl Into<String>) -> Self {
        self.text_color = text_color.into();
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }

    /// Whether the colour is left for the engine to choose.
    pub fn has_auto_color(&self) -> bool {
        self.text_color.trim().eq_ignore_ascii_case(AUTO_COLOR)
    }

    /// Validate all fields and return the parsed text colour.
    ///
    /// `auto` is not accepted here: it must be resolved against a
    /// background before rendering.
    pub fn validate(&self, fonts: &FontRegistry) -> Result<Color, OverlayError> {
        if !fonts.contains(&self.font_family) {
            return Err(OverlayError::invalid_style(format!(
                "Unsupported font family '{}'",
                self.font_family
            )));
        }

        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(OverlayError::invalid_style(format!(
                "font_size {} outside {}..={}",
                self.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE
            )));
        }

        if !self.opacity.is_finite() || !(MIN_OPACITY..=MAX_OPACITY).contains(&self.opacity) {
            return Err(OverlayError::invalid_style(format!(
                "opacity {} outside {}..={}",
                self.opacity, MIN_OPACITY, MAX_OPACITY
            )));
        }

        if self.has_auto_color() {
            return Err(OverlayError::invalid_style(
                "text_color 'auto' must be resolved before rendering",
            ));
        }

        parse_color(&self.text_color)
    }
}
