// TextOverlay Library
// Placement analysis and text compositing for image captions

pub mod analyzer;
pub mod cancel;
pub mod color;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod logging;
pub mod session;
pub mod style;

use image::DynamicImage;
use std::sync::OnceLock;

pub use analyzer::{
    Analysis, Analyzer, PlacementCandidate, PlacementResult, PositionPriority, Quality,
};
pub use cancel::{AnalysisSlot, CancellationToken};
pub use color::Color;
pub use compositor::{Compositor, RenderedImage};
pub use config::EngineConfig;
pub use engine::{Engine, RunOutput};
pub use error::{OverlayError, Result};
pub use grid::Position;
pub use session::{OverlaySession, SessionState};
pub use style::{BlendMode, StyleConfig};

static DEFAULT_ENGINE: OnceLock<Result<Engine>> = OnceLock::new();

/// Shared engine with the built-in configuration.
pub fn default_engine() -> Result<&'static Engine> {
    DEFAULT_ENGINE
        .get_or_init(|| Engine::new(EngineConfig::default()))
        .as_ref()
        .map_err(Clone::clone)
}

/// Score all nine placements for `text` on `image` with the default engine.
pub fn analyze(image: &DynamicImage, text: &str) -> Result<PlacementResult> {
    default_engine()?.analyze(image, text)
}

/// Render `text` at `position` with the default engine.
pub fn render(
    image: &DynamicImage,
    text: &str,
    position: Position,
    style: &StyleConfig,
) -> Result<RenderedImage> {
    default_engine()?.render(image, text, position, style)
}
