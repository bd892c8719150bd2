//! Placement scoring.
//!
//! ```text
//! score = clutter_weight  * (1 - mean saliency)
//!       + contrast_weight * contrast
//!       + prior_weight    * position prior
//!       - edge_weight     * edge penalty            clamped to [0, 1]
//! ```
//!
//! | Term | Range | Meaning |
//! |------|-------|---------|
//! | clutter | 0..1 | 1 for a perfectly flat cell |
//! | contrast | ~0.18..1 | best WCAG ratio of the cell mean against white or black text, `(ratio - 1) / 20` |
//! | prior | 0.70..1 | caption conventions: bottom row and centre column preferred |
//! | edge penalty | 0..1 | how far the estimated text box intrudes into the border margin |
//!
//! With the default weights (0.55 / 0.25 / 0.20 / 0.15) a flat white cell
//! in the bottom-centre position scores exactly 1.0.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::OverlayError;
use crate::grid::{CellRect, Position};
use crate::style::{MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Share of the cell height a single line may occupy.
const HEIGHT_FILL: f32 = 0.8;

fn default_clutter_weight() -> f64 {
    0.55
}

fn default_contrast_weight() -> f64 {
    0.25
}

fn default_prior_weight() -> f64 {
    0.20
}

fn default_edge_weight() -> f64 {
    0.15
}

fn default_fit_fraction() -> f32 {
    0.9
}

fn default_margin_fraction() -> f32 {
    0.015
}

fn default_min_margin_px() -> u32 {
    4
}

/// Weights of the four score terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_clutter_weight")]
    pub clutter: f64,
    #[serde(default = "default_contrast_weight")]
    pub contrast: f64,
    #[serde(default = "default_prior_weight")]
    pub prior: f64,
    #[serde(default = "default_edge_weight")]
    pub edge: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            clutter: default_clutter_weight(),
            contrast: default_contrast_weight(),
            prior: default_prior_weight(),
            edge: default_edge_weight(),
        }
    }
}

/// Tunable analyzer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,

    /// Fraction of the cell width the estimated text may fill (default: 0.9)
    #[serde(default = "default_fit_fraction")]
    pub fit_fraction: f32,

    /// Border margin as a fraction of the shorter image side (default: 0.015)
    #[serde(default = "default_margin_fraction")]
    pub margin_fraction: f32,

    /// Lower bound of the border margin in pixels (default: 4)
    #[serde(default = "default_min_margin_px")]
    pub min_margin_px: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            fit_fraction: default_fit_fraction(),
            margin_fraction: default_margin_fraction(),
            min_margin_px: default_min_margin_px(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), OverlayError> {
        let w = &self.weights;
        for (name, value) in [
            ("clutter", w.clutter),
            ("contrast", w.contrast),
            ("prior", w.prior),
            ("edge", w.edge),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OverlayError::config(format!(
                    "scoring weight '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !(self.fit_fraction > 0.0 && self.fit_fraction <= 1.0) {
            return Err(OverlayError::config(format!(
                "fit_fraction must be in (0, 1], got {}",
                self.fit_fraction
            )));
        }
        if !(0.0..0.5).contains(&self.margin_fraction) {
            return Err(OverlayError::config(format!(
                "margin_fraction must be in [0, 0.5), got {}",
                self.margin_fraction
            )));
        }
        Ok(())
    }

    /// Required distance between text and a touching image border.
    pub fn margin_px(&self, image_width: u32, image_height: u32) -> f32 {
        let relative = self.margin_fraction * image_width.min(image_height) as f32;
        relative.max(self.min_margin_px as f32)
    }
}

/// Caption-convention preference per position.
pub fn position_prior(position: Position) -> f64 {
    match position {
        Position::BottomCenter => 1.0,
        Position::BottomLeft | Position::BottomRight => 0.9,
        Position::TopCenter => 0.85,
        Position::Center => 0.8,
        Position::TopLeft | Position::TopRight => 0.75,
        Position::CenterLeft | Position::CenterRight => 0.7,
    }
}

/// Legibility of plain white or black text on `background`, in [0, 1].
pub fn contrast_term(background: &Color) -> f64 {
    let best = background
        .contrast_ratio(&Color::white())
        .max(background.contrast_ratio(&Color::black()));
    ((best - 1.0) / 20.0).clamp(0.0, 1.0)
}

/// Largest font size whose single-line rendering fits the cell.
///
/// `em_width` is the width of the whole caption at a 1px font size, either
/// measured with the face or estimated as `chars * avg_char_width`. The
/// result is clamped to the style range, so it never increases as the
/// caption grows.
pub fn recommended_font_size(cell: &CellRect, em_width: f32, fit_fraction: f32) -> u32 {
    if cell.is_empty() {
        return MIN_FONT_SIZE;
    }
    let by_width = fit_fraction * cell.width as f32 / em_width.max(f32::EPSILON);
    let by_height = cell.height as f32 * HEIGHT_FILL / LINE_HEIGHT;
    // Tolerate f32 rounding just below a whole size
    let size = (by_width.min(by_height) + 1e-3).floor();
    (size.max(0.0) as u32).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Width estimate used when no face is available to measure with.
pub fn estimated_em_width(chars: usize, avg_char_width: f32) -> f32 {
    chars.max(1) as f32 * avg_char_width
}

/// (width, height) of the single-line text box in pixels.
pub fn estimated_text_box(font_size: u32, em_width: f32) -> (f32, f32) {
    let size = font_size as f32;
    (size * em_width, size * LINE_HEIGHT)
}

/// How far a centred text box intrudes into the margin along the image
/// borders the cell touches: 0 when clear, 1 when it reaches (or crosses)
/// the border.
pub fn edge_penalty(position: Position, cell: &CellRect, text_box: (f32, f32), margin: f32) -> f64 {
    if cell.is_empty() {
        return 1.0;
    }
    let shortfall = |slack: f32| {
        if margin <= 0.0 {
            return if slack < 0.0 { 1.0 } else { 0.0 };
        }
        ((margin - slack) / margin).clamp(0.0, 1.0) as f64
    };

    let slack_x = (cell.width as f32 - text_box.0) / 2.0;
    let slack_y = (cell.height as f32 - text_box.1) / 2.0;

    let horizontal = if position.touches_vertical_border() {
        shortfall(slack_x)
    } else {
        0.0
    };
    let vertical = if position.touches_horizontal_border() {
        shortfall(slack_y)
    } else {
        0.0
    };
    horizontal.max(vertical)
}

/// Inputs of one cell's score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreTerms {
    pub mean_saliency: f64,
    pub contrast: f64,
    pub prior: f64,
    pub edge_penalty: f64,
}

pub fn combine(weights: &ScoringWeights, terms: &ScoreTerms) -> f64 {
    let score = weights.clutter * (1.0 - terms.mean_saliency.clamp(0.0, 1.0))
        + weights.contrast * terms.contrast
        + weights.prior * terms.prior
        - weights.edge * terms.edge_penalty;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
