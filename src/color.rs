//! Text colours.
//!
//! Colours arrive as strings (from style configuration or the UI) and are
//! parsed here. Supported forms:
//!
//! - Named palette entries: `white`, `black`, `navy`, `gold`,
//!   `spotify green`, `instagram pink`, `netflix red`, `apple gray`
//!   (case-insensitive, `-`/`_` accepted in place of spaces)
//! - `#RGB` and `#RRGGBB`
//! - `rgb(r, g, b)` with decimal components

use crate::error::OverlayError;

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// WCAG relative luminance in [0, 1].
    pub fn relative_luminance(&self) -> f64 {
        fn linear(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// WCAG contrast ratio between two colours, in [1, 21].
    pub fn contrast_ratio(&self, other: &Color) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
        (hi + 0.05) / (lo + 0.05)
    }

    /// Scale every channel by `factor` (0 = black, 1 = unchanged).
    pub fn darken(&self, factor: f32) -> Color {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * f).round() as u8;
        Color::new(scale(self.r), scale(self.g), scale(self.b))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Named colours offered by the style editor.
pub const PALETTE: [(&str, Color); 8] = [
    ("white", Color::new(255, 255, 255)),
    ("black", Color::new(0, 0, 0)),
    ("navy", Color::new(0, 0, 128)),
    ("gold", Color::new(255, 215, 0)),
    ("spotify green", Color::new(29, 185, 84)),
    ("instagram pink", Color::new(225, 48, 108)),
    ("netflix red", Color::new(229, 9, 20)),
    ("apple gray", Color::new(142, 142, 147)),
];

/// Look up a palette entry by name.
pub fn named_color(name: &str) -> Option<Color> {
    let normalized = name.trim().to_ascii_lowercase().replace(['-', '_'], " ");
    PALETTE
        .iter()
        .find(|(n, _)| *n == normalized)
        .map(|(_, c)| *c)
}

/// Parse any supported colour notation.
pub fn parse_color(value: &str) -> Result<Color, OverlayError> {
    let value = value.trim();
    if value.starts_with('#') {
        return parse_hex_color(value);
    }
    if let Some(inner) = value
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_triplet(inner);
    }
    named_color(value)
        .ok_or_else(|| OverlayError::invalid_style(format!("Unknown text color '{}'", value)))
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
pub fn parse_hex_color(hex: &str) -> Result<Color, OverlayError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| OverlayError::invalid_style("Color must start with '#'"))?;

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| OverlayError::invalid_style(format!("Invalid hex digits '{}'", s)))
    };

    if !hex.is_ascii() {
        return Err(OverlayError::invalid_style("Color must be ASCII hex"));
    }

    match hex.len() {
        3 => {
            // #RGB format - each digit doubled: 0xF -> 0xFF
            let r = digit(&hex[0..1])?;
            let g = digit(&hex[1..2])?;
            let b = digit(&hex[2..3])?;
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(OverlayError::invalid_style(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

fn parse_rgb_triplet(inner: &str) -> Result<Color, OverlayError> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(OverlayError::invalid_style(format!(
            "rgb() needs 3 components, got {}",
            parts.len()
        )));
    }
    let channel = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| OverlayError::invalid_style(format!("Invalid rgb component '{}'", s)))
    };
    Ok(Color::new(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
    ))
}
