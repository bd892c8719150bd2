//! Saliency and layout analysis.
//!
//! Given an image and a caption, the analyzer scores each of the nine grid
//! cells as a place for the caption and recommends a font size for it.
//!
//! # Pipeline
//!
//! 1. Validate the input (non-zero dimensions, non-blank text)
//! 2. Downscale to the working resolution (`max_dimension` on the longest
//!    side); small images are analysed as-is
//! 3. Compute the [`SaliencyMap`]
//! 4. Partition both the working copy and the original into the 3x3 grid
//! 5. Per cell: mean saliency and mean colour from the working copy, font
//!    size and edge penalty from the full-resolution geometry
//! 6. Combine into a score, bucket into a [`Quality`], rank
//!
//! # Example
//!
//! ```ignore
//! use textoverlay::analyzer::Analyzer;
//!
//! let analyzer = Analyzer::default();
//! let result = analyzer.analyze(&image, "SUMMER SALE")?;
//! println!("best: {} ({:.2})", result.best().position, result.best().score);
//! ```

pub mod placement;
pub mod saliency;
pub mod scoring;

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use std::time::Instant;

use crate::cancel::CancellationToken;
use crate::color::{Color, PALETTE};
use crate::compositor::layout::measure_line;
use crate::error::OverlayError;
use crate::grid::{partition, CellRect, Position};
use crate::style::StyleConfig;

pub use placement::{PlacementCandidate, PlacementResult, PositionPriority, Quality};
pub use saliency::SaliencyMap;
pub use scoring::{ScoreTerms, ScoringConfig, ScoringWeights};

/// Default longest side of the working copy.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Average character width assumed when no face is available to measure
/// with (DejaVu Sans, mixed case).
pub const DEFAULT_AVG_CHAR_WIDTH: f32 = 0.55;

/// Pixel size the caption is measured at before normalising to 1px.
const MEASURE_SCALE: f32 = 100.0;

/// Per-cell measurements behind a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStats {
    pub position: Position,
    /// Cell rectangle in full-resolution pixels.
    pub rect: CellRect,
    pub mean_color: Color,
    pub mean_saliency: f64,
    pub contrast: f64,
    pub prior: f64,
    pub edge_penalty: f64,
}

impl CellStats {
    pub fn is_degenerate(&self) -> bool {
        self.rect.is_empty()
    }
}

/// Placement result plus the per-cell data it was derived from.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub placements: PlacementResult,
    pub cells: [CellStats; 9],
    pub image_size: (u32, u32),
}

impl Analysis {
    pub fn cell(&self, position: Position) -> &CellStats {
        &self.cells[position.index()]
    }

    /// Mean colour of the cell, the background the text will sit on.
    pub fn background(&self, position: Position) -> Color {
        self.cell(position).mean_color
    }

    /// Palette colour with the highest contrast against the cell.
    pub fn suggest_text_color(&self, position: Position) -> Color {
        self.palette_by_contrast(position)
            .first()
            .map(|(_, color)| *color)
            .unwrap_or_else(Color::white)
    }

    /// Up to `top_k` styles for `position`, most legible colour first.
    ///
    /// Each suggestion is `base` with the text colour replaced by a palette
    /// entry and the font size set to the cell's recommendation.
    pub fn suggest_styles(
        &self,
        position: Position,
        base: &StyleConfig,
        top_k: usize,
    ) -> Vec<StyleConfig> {
        let font_size = self.placements.get(position).recommended_font_size;
        self.palette_by_contrast(position)
            .into_iter()
            .take(top_k)
            .map(|(name, _)| {
                base.clone()
                    .with_text_color(name)
                    .with_font_size(font_size)
            })
            .collect()
    }

    fn palette_by_contrast(&self, position: Position) -> Vec<(&'static str, Color)> {
        let background = self.background(position);
        let mut ranked: Vec<(&'static str, Color, f64)> = PALETTE
            .iter()
            .map(|(name, color)| (*name, *color, color.contrast_ratio(&background)))
            .collect();
        // Stable sort keeps palette order among equal ratios
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2));
        ranked.into_iter().map(|(name, color, _)| (name, color)).collect()
    }
}

/// Scores placements for a caption on an image.
#[derive(Debug, Clone)]
pub struct Analyzer {
    scoring: ScoringConfig,
    priority: PositionPriority,
    avg_char_width: f32,
    max_dimension: u32,
    /// Face the caption is measured with; the width heuristic is used
    /// without one.
    measure_font: Option<FontArc>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            priority: PositionPriority::default(),
            avg_char_width: DEFAULT_AVG_CHAR_WIDTH,
            max_dimension: DEFAULT_MAX_DIMENSION,
            measure_font: None,
        }
    }
}

impl Analyzer {
    pub fn new(
        scoring: ScoringConfig,
        priority: PositionPriority,
        avg_char_width: f32,
        max_dimension: u32,
    ) -> Result<Self, OverlayError> {
        scoring.validate()?;
        if !(avg_char_width.is_finite() && avg_char_width > 0.0) {
            return Err(OverlayError::config(format!(
                "average character width must be positive, got {}",
                avg_char_width
            )));
        }
        if max_dimension < 3 {
            return Err(OverlayError::config(format!(
                "analysis_max_dimension must be at least 3, got {}",
                max_dimension
            )));
        }
        Ok(Self {
            scoring,
            priority,
            avg_char_width,
            max_dimension,
            measure_font: None,
        })
    }

    /// Size captions by measuring them with `font` instead of the average
    /// character width.
    pub fn with_measure_font(mut self, font: FontArc) -> Self {
        self.measure_font = Some(font);
        self
    }

    pub fn measure_font(&self) -> Option<&FontArc> {
        self.measure_font.as_ref()
    }

    /// Single-line width of `text` at a 1px font size.
    ///
    /// Whitespace runs and line breaks count as one space, so appending to
    /// a caption never makes it narrower.
    pub fn text_em_width(&self, text: &str) -> f32 {
        match &self.measure_font {
            Some(font) => {
                let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
                measure_line(font, PxScale::from(MEASURE_SCALE), &line) / MEASURE_SCALE
            }
            None => scoring::estimated_em_width(text.trim().chars().count(), self.avg_char_width),
        }
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn priority(&self) -> &PositionPriority {
        &self.priority
    }

    pub fn avg_char_width(&self) -> f32 {
        self.avg_char_width
    }

    pub fn analyze(
        &self,
        image: &DynamicImage,
        text: &str,
    ) -> Result<PlacementResult, OverlayError> {
        self.analyze_detailed(image, text, None).map(|a| a.placements)
    }

    pub fn analyze_with_cancel(
        &self,
        image: &DynamicImage,
        text: &str,
        token: &CancellationToken,
    ) -> Result<PlacementResult, OverlayError> {
        self.analyze_detailed(image, text, Some(token))
            .map(|a| a.placements)
    }

    /// Full analysis including per-cell statistics.
    pub fn analyze_detailed(
        &self,
        image: &DynamicImage,
        text: &str,
        token: Option<&CancellationToken>,
    ) -> Result<Analysis, OverlayError> {
        let started = Instant::now();
        let chars = validate_input(image, text)?;
        let (width, height) = (image.width(), image.height());

        if token.map(CancellationToken::is_cancelled).unwrap_or(false) {
            return Err(OverlayError::Cancelled);
        }

        let working = working_copy(image, self.max_dimension);
        let saliency = SaliencyMap::compute(&working, token)?;

        let full_cells = partition(width, height);
        let work_cells = partition(working.width(), working.height());
        let margin = self.scoring.margin_px(width, height);
        let em_width = self.text_em_width(text);

        let stats: Vec<(CellStats, PlacementCandidate)> = Position::ALL
            .par_iter()
            .map(|&position| {
                let full = full_cells[position.index()];
                let work = work_cells[position.index()];
                self.score_cell(position, full, work, &working, &saliency, em_width, margin)
            })
            .collect();

        let cells: [CellStats; 9] = Position::ALL.map(|p| stats[p.index()].0);
        let candidates: [PlacementCandidate; 9] = Position::ALL.map(|p| stats[p.index()].1);
        let placements = PlacementResult::new(candidates, &self.priority);

        let best = placements.best();
        tracing::debug!(
            width = width,
            height = height,
            working_width = working.width(),
            working_height = working.height(),
            chars = chars,
            em_width = em_width,
            best_position = %best.position,
            best_score = best.score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Placement analysis complete"
        );

        Ok(Analysis {
            placements,
            cells,
            image_size: (width, height),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn score_cell(
        &self,
        position: Position,
        full: CellRect,
        work: CellRect,
        working: &RgbImage,
        saliency: &SaliencyMap,
        em_width: f32,
        margin: f32,
    ) -> (CellStats, PlacementCandidate) {
        let font_size = scoring::recommended_font_size(&full, em_width, self.scoring.fit_fraction);
        let prior = scoring::position_prior(position);

        if full.is_empty() || work.is_empty() {
            let stats = CellStats {
                position,
                rect: full,
                mean_color: Color::black(),
                mean_saliency: 1.0,
                contrast: 0.0,
                prior,
                edge_penalty: 1.0,
            };
            return (stats, PlacementCandidate::new(position, 0.0, font_size));
        }

        let text_box = scoring::estimated_text_box(font_size, em_width);
        let mean_color = mean_color(working, &work);
        let terms = ScoreTerms {
            mean_saliency: saliency.mean_in(&work),
            contrast: scoring::contrast_term(&mean_color),
            prior,
            edge_penalty: scoring::edge_penalty(position, &full, text_box, margin),
        };
        let score = scoring::combine(&self.scoring.weights, &terms);

        let stats = CellStats {
            position,
            rect: full,
            mean_color,
            mean_saliency: terms.mean_saliency,
            contrast: terms.contrast,
            prior: terms.prior,
            edge_penalty: terms.edge_penalty,
        };
        (stats, PlacementCandidate::new(position, score, font_size))
    }
}

/// Check dimensions and text; returns the character count of the trimmed
/// text.
pub fn validate_input(image: &DynamicImage, text: &str) -> Result<usize, OverlayError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(OverlayError::invalid_input(format!(
            "Image has zero dimension ({}x{})",
            image.width(),
            image.height()
        )));
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(OverlayError::invalid_input("Text is empty"));
    }
    Ok(trimmed.chars().count())
}

/// RGB copy whose longest side is at most `max_dimension`.
///
/// Neither axis shrinks below 3px (or its original size, if smaller), so a
/// cell is empty in the working copy only when it is empty in the original.
fn working_copy(image: &DynamicImage, max_dimension: u32) -> RgbImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let longest = width.max(height);
    if longest <= max_dimension {
        return rgb;
    }

    let scale = max_dimension as f64 / longest as f64;
    let shrink = |len: u32| ((len as f64 * scale).round() as u32).max(len.min(3));
    imageops::resize(&rgb, shrink(width), shrink(height), FilterType::Triangle)
}

fn mean_color(image: &RgbImage, rect: &CellRect) -> Color {
    let mut sums = [0u64; 3];
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let p = image.get_pixel(x, y);
            for (sum, channel) in sums.iter_mut().zip(p.0) {
                *sum += channel as u64;
            }
        }
    }
    let n = rect.area().max(1);
    let avg = |sum: u64| ((sum + n / 2) / n) as u8;
    Color::new(avg(sums[0]), avg(sums[1]), avg(sums[2]))
}
