//! Editing session: the state a host keeps between user actions.
//!
//! ```text
//! Empty --load_image--> ImageLoaded --begin_analysis--> Analyzing
//!                            ^                              |
//!                            |                    complete_analysis
//!                        set_text                           v
//!                            +--------------------------- Analyzed <--+
//!                                                           |         |
//!                                                         render   set_style /
//!                                                           v      select_position
//!                                                       Rendering     |
//!                                                           v         |
//!                                                        Rendered ----+
//! ```
//!
//! A failed operation leaves the session exactly as it was: the image, the
//! text and the last successful render survive.

use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

use crate::analyzer::PlacementResult;
use crate::cancel::{AnalysisSlot, AnalysisTicket};
use crate::compositor::RenderedImage;
use crate::engine::Engine;
use crate::error::OverlayError;
use crate::grid::Position;
use crate::style::StyleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    ImageLoaded,
    Analyzing,
    Analyzed,
    Rendering,
    Rendered,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::ImageLoaded => "image_loaded",
            Self::Analyzing => "analyzing",
            Self::Analyzed => "analyzed",
            Self::Rendering => "rendering",
            Self::Rendered => "rendered",
        };
        f.write_str(name)
    }
}

/// Work order returned by [`OverlaySession::begin_analysis`].
///
/// Run it anywhere (e.g. [`Engine::analyze_async`] with the ticket's token)
/// and hand the outcome back through
/// [`OverlaySession::complete_analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub ticket: AnalysisTicket,
    pub image: Arc<DynamicImage>,
    pub text: String,
}

#[derive(Debug)]
pub struct OverlaySession {
    engine: Engine,
    state: SessionState,
    /// State to return to if the in-flight analysis fails.
    resume_state: SessionState,
    image: Option<Arc<DynamicImage>>,
    text: String,
    placements: Option<PlacementResult>,
    selected: Option<Position>,
    style: StyleConfig,
    rendered: Option<RenderedImage>,
    slot: AnalysisSlot,
}

impl OverlaySession {
    pub fn new(engine: Engine) -> Self {
        let style = engine.default_style().clone();
        Self {
            engine,
            state: SessionState::Empty,
            resume_state: SessionState::Empty,
            image: None,
            text: String::new(),
            placements: None,
            selected: None,
            style,
            rendered: None,
            slot: AnalysisSlot::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placements(&self) -> Option<&PlacementResult> {
        self.placements.as_ref()
    }

    pub fn selected_position(&self) -> Option<Position> {
        self.selected
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Most recent successful render, even if the style has changed since.
    pub fn rendered(&self) -> Option<&RenderedImage> {
        self.rendered.as_ref()
    }

    /// Replace the image. Any analysis or render of the old image is dropped.
    pub fn load_image(&mut self, image: DynamicImage) -> Result<(), OverlayError> {
        self.guard_not_busy("load_image")?;
        if image.width() == 0 || image.height() == 0 {
            return Err(OverlayError::invalid_input(format!(
                "Image has zero dimension ({}x{})",
                image.width(),
                image.height()
            )));
        }

        self.slot.cancel();
        self.image = Some(Arc::new(image));
        self.placements = None;
        self.selected = None;
        self.rendered = None;
        self.transition(SessionState::ImageLoaded);
        Ok(())
    }

    /// Change the caption. An existing or in-flight analysis becomes stale.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), OverlayError> {
        self.guard_not_busy("set_text")?;
        self.text = text.into();
        if self.state == SessionState::Analyzing {
            self.slot.cancel();
        }
        if matches!(
            self.state,
            SessionState::Analyzing | SessionState::Analyzed | SessionState::Rendered
        ) {
            self.placements = None;
            self.selected = None;
            self.transition(SessionState::ImageLoaded);
        }
        Ok(())
    }

    /// Start an analysis, superseding any that is in flight.
    pub fn begin_analysis(&mut self) -> Result<AnalysisRequest, OverlayError> {
        let image = match (&self.image, self.state) {
            (
                Some(image),
                SessionState::ImageLoaded
                | SessionState::Analyzing
                | SessionState::Analyzed
                | SessionState::Rendered,
            ) => image.clone(),
            _ => return Err(self.invalid_transition("begin_analysis")),
        };
        if self.text.trim().is_empty() {
            return Err(OverlayError::invalid_input("Text is empty"));
        }

        if self.state != SessionState::Analyzing {
            self.resume_state = self.state;
        }
        let ticket = self.slot.begin();
        self.transition(SessionState::Analyzing);
        Ok(AnalysisRequest {
            ticket,
            image,
            text: self.text.clone(),
        })
    }

    /// Deliver the outcome of a request.
    ///
    /// Returns `Ok(false)` if the request was superseded and its outcome
    /// ignored. On success the best candidate is selected and the style's
    /// font size set to its recommendation.
    pub fn complete_analysis(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<PlacementResult, OverlayError>,
    ) -> Result<bool, OverlayError> {
        if self.state != SessionState::Analyzing || !self.slot.is_current(ticket) {
            return Ok(false);
        }
        let _ = self.slot.accept(ticket, ());

        match outcome {
            Ok(placements) => {
                let best = *placements.best();
                self.selected = Some(best.position);
                self.style.font_size = best.recommended_font_size;
                self.placements = Some(placements);
                self.transition(SessionState::Analyzed);
                Ok(true)
            }
            Err(e) => {
                self.transition(self.resume_state);
                Err(e)
            }
        }
    }

    /// Analyze synchronously on the calling thread.
    pub fn analyze(&mut self) -> Result<&PlacementResult, OverlayError> {
        let request = self.begin_analysis()?;
        let outcome = self
            .engine
            .analyze_with_cancel(&request.image, &request.text, request.ticket.token());
        self.complete_analysis(&request.ticket, outcome)?;
        self.placements
            .as_ref()
            .ok_or_else(|| OverlayError::Internal("analysis produced no result".to_string()))
    }

    /// Choose a position; the font size follows its recommendation.
    pub fn select_position(&mut self, position: Position) -> Result<(), OverlayError> {
        let placements = match (&self.placements, self.state) {
            (Some(p), SessionState::Analyzed | SessionState::Rendered) => p,
            _ => return Err(self.invalid_transition("select_position")),
        };
        self.style.font_size = placements.get(position).recommended_font_size;
        self.selected = Some(position);
        self.transition(SessionState::Analyzed);
        Ok(())
    }

    pub fn set_style(&mut self, style: StyleConfig) -> Result<(), OverlayError> {
        self.guard_not_busy("set_style")?;
        self.style = style;
        if self.state == SessionState::Rendered {
            self.transition(SessionState::Analyzed);
        }
        Ok(())
    }

    /// Render the caption at the selected position with the current style.
    pub fn render(&mut self) -> Result<&RenderedImage, OverlayError> {
        let (image, position) = match (&self.image, self.selected, self.state) {
            (Some(image), Some(position), SessionState::Analyzed | SessionState::Rendered) => {
                (image.clone(), position)
            }
            _ => return Err(self.invalid_transition("render")),
        };

        let previous = self.state;
        self.transition(SessionState::Rendering);
        match self.engine.render(&image, &self.text, position, &self.style) {
            Ok(rendered) => {
                self.transition(SessionState::Rendered);
                Ok(self.rendered.insert(rendered))
            }
            Err(e) => {
                self.transition(previous);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "Session state change");
            self.state = next;
        }
    }

    fn guard_not_busy(&self, operation: &str) -> Result<(), OverlayError> {
        if self.state == SessionState::Rendering {
            return Err(self.invalid_transition(operation));
        }
        Ok(())
    }

    fn invalid_transition(&self, operation: &str) -> OverlayError {
        OverlayError::InvalidState(format!("{} is not allowed in state {}", operation, self.state))
    }
}
