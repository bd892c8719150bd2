// Error types module

/// Centralized error type for the overlay engine
///
/// The first three variants are the engine's caller-facing taxonomy:
/// malformed analysis input, out-of-range style fields, and runtime asset
/// problems while compositing. Every error is terminal for the call that
/// raised it; no partial result accompanies it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    /// Malformed image or text (zero dimension, empty caption, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown or out-of-range style field supplied to the compositor
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// Environment/asset problem during compositing (font not loadable, ...)
    #[error("Render failure: {0}")]
    RenderFailure(String),

    /// Analysis abandoned through its cancellation token
    #[error("Analysis cancelled")]
    Cancelled,

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Offloaded work failed to complete (panicked or was aborted)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OverlayError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_style(message: impl Into<String>) -> Self {
        Self::InvalidStyle(message.into())
    }

    pub fn render_failure(message: impl Into<String>) -> Self {
        Self::RenderFailure(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidStyle(_) => "invalid_style",
            Self::RenderFailure(_) => "render_failure",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config",
            Self::InvalidState(_) => "invalid_state",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error was caused by what the caller passed in, as opposed
    /// to the environment the engine runs in.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::InvalidStyle(_) | Self::InvalidState(_)
        )
    }
}

pub type Result<T, E = OverlayError> = std::result::Result<T, E>;
