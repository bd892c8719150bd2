//! Engine: configured analyzer and compositor behind one cheap handle.
//!
//! An [`Engine`] is built once from an [`EngineConfig`] and then shared;
//! cloning it only bumps a reference count. All operations take `&self` and
//! are safe to call from many threads at once.

use image::DynamicImage;
use std::sync::Arc;

use crate::analyzer::{Analysis, Analyzer, PlacementResult};
use crate::cancel::{AnalysisSlot, CancellationToken};
use crate::compositor::{Compositor, RenderedImage};
use crate::config::EngineConfig;
use crate::error::OverlayError;
use crate::grid::Position;
use crate::style::{StyleConfig, MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Lower bound of the automatic font size in [`Engine::run`].
const RUN_MIN_FONT_SIZE: u32 = 16;

/// Share of the shorter image side used as the automatic font size cap.
const RUN_FONT_SIZE_FRACTION: f64 = 0.05;

struct EngineInner {
    config: EngineConfig,
    analyzer: Analyzer,
    compositor: Compositor,
}

#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("fonts", &self.inner.compositor.fonts().len())
            .field("default_style", &self.inner.config.default_style)
            .finish()
    }
}

/// Everything [`Engine::run`] decided and produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub placements: PlacementResult,
    pub position: Position,
    pub style: StyleConfig,
    pub image: RenderedImage,
}

impl Engine {
    /// Validate `config` and build the engine.
    pub fn new(config: EngineConfig) -> Result<Self, OverlayError> {
        config.validate()?;

        let fonts = config.font_registry()?;
        let family = &config.default_style.font_family;
        let avg_char_width = fonts.avg_char_width(family).ok_or_else(|| {
            OverlayError::config(format!("Default font family '{}' is not registered", family))
        })?;

        let analyzer = Analyzer::new(
            config.scoring,
            config.position_priority,
            avg_char_width,
            config.analysis_max_dimension,
        )?;
        // Size captions with the face they will be drawn in
        let analyzer = match fonts.resolve(family) {
            Ok(font) => analyzer.with_measure_font(font),
            Err(e) => {
                tracing::warn!(
                    family = %family,
                    error = %e,
                    "Sizing captions by average character width"
                );
                analyzer
            }
        };
        let compositor = Compositor::new(fonts, config.shadow);

        tracing::info!(
            font_families = compositor.fonts().len(),
            default_family = %family,
            analysis_max_dimension = config.analysis_max_dimension,
            "Overlay engine initialized"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                analyzer,
                compositor,
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.inner.analyzer
    }

    pub fn compositor(&self) -> &Compositor {
        &self.inner.compositor
    }

    pub fn default_style(&self) -> &StyleConfig {
        &self.inner.config.default_style
    }

    pub fn analyze(
        &self,
        image: &DynamicImage,
        text: &str,
    ) -> Result<PlacementResult, OverlayError> {
        self.inner.analyzer.analyze(image, text)
    }

    pub fn analyze_with_cancel(
        &self,
        image: &DynamicImage,
        text: &str,
        token: &CancellationToken,
    ) -> Result<PlacementResult, OverlayError> {
        self.inner.analyzer.analyze_with_cancel(image, text, token)
    }

    pub fn analyze_detailed(
        &self,
        image: &DynamicImage,
        text: &str,
        token: Option<&CancellationToken>,
    ) -> Result<Analysis, OverlayError> {
        self.inner.analyzer.analyze_detailed(image, text, token)
    }

    /// Run an analysis on tokio's blocking pool.
    pub async fn analyze_async(
        &self,
        image: Arc<DynamicImage>,
        text: String,
        token: CancellationToken,
    ) -> Result<PlacementResult, OverlayError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.analyze_with_cancel(&image, &text, &token))
            .await
            .map_err(|e| OverlayError::Internal(format!("analysis task failed: {}", e)))?
    }

    /// Last-call-wins analysis through `slot`.
    ///
    /// Starting here cancels whatever analysis the slot was tracking.
    /// Returns `Ok(None)` if this analysis was itself superseded or
    /// cancelled before it finished.
    pub async fn analyze_in_slot(
        &self,
        slot: &AnalysisSlot,
        image: Arc<DynamicImage>,
        text: String,
    ) -> Result<Option<PlacementResult>, OverlayError> {
        let ticket = slot.begin();
        match self.analyze_async(image, text, ticket.token().clone()).await {
            Ok(result) => Ok(slot.accept(&ticket, result)),
            Err(OverlayError::Cancelled) => {
                tracing::debug!(generation = ticket.generation(), "Analysis cancelled");
                Ok(None)
            }
            Err(e) => {
                let _ = slot.accept(&ticket, ());
                Err(e)
            }
        }
    }

    pub fn render(
        &self,
        image: &DynamicImage,
        text: &str,
        position: Position,
        style: &StyleConfig,
    ) -> Result<RenderedImage, OverlayError> {
        self.inner.compositor.render(image, text, position, style)
    }

    /// Styles for `position`, most legible colour first, based on the
    /// engine's default style.
    pub fn suggest_styles(
        &self,
        image: &DynamicImage,
        text: &str,
        position: Position,
        top_k: usize,
    ) -> Result<Vec<StyleConfig>, OverlayError> {
        let analysis = self.analyze_detailed(image, text, None)?;
        Ok(analysis.suggest_styles(position, self.default_style(), top_k))
    }

    /// Analyze, pick a position and style, and render in one call.
    ///
    /// Uses `preferred` if given, otherwise the best-ranked position. The
    /// font size is the cell's recommendation capped at 5% of the shorter
    /// image side (but not below 16px); an `auto` text colour becomes the
    /// palette colour with the best contrast against the cell.
    pub fn run(
        &self,
        image: &DynamicImage,
        text: &str,
        preferred: Option<Position>,
    ) -> Result<RunOutput, OverlayError> {
        let analysis = self.analyze_detailed(image, text, None)?;
        let position = preferred.unwrap_or_else(|| analysis.placements.best().position);
        let recommended = analysis.placements.get(position).recommended_font_size;

        let shorter = image.width().min(image.height()) as f64;
        let cap = ((shorter * RUN_FONT_SIZE_FRACTION).floor() as u32).max(RUN_MIN_FONT_SIZE);
        let font_size = recommended.min(cap).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);

        let mut style = self.default_style().clone().with_font_size(font_size);
        if style.has_auto_color() {
            style = style.with_text_color(analysis.suggest_text_color(position).to_hex());
        }

        let rendered = self.render(image, text, position, &style)?;
        tracing::info!(
            position = %position,
            font_size = font_size,
            text_color = %style.text_color,
            fingerprint = %rendered.fingerprint(),
            "Overlay pipeline complete"
        );

        Ok(RunOutput {
            placements: analysis.placements,
            position,
            style,
            image: rendered,
        })
    }
}
