//! Font registry.
//!
//! The registry is the closed list of font families a style may name. Each
//! entry carries:
//!
//! - an average character width (fraction of the em size) used by the
//!   analyzer to estimate rendered text width without rasterizing, and
//! - the face used for actual glyph rendering.
//!
//! Registry membership and face availability are separate concerns: a
//! family that is registered but whose face could not be loaded is still a
//! valid style choice, and rendering it fails with `RenderFailure` instead
//! of `InvalidStyle`.

use ab_glyph::FontArc;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::OverlayError;

/// Embedded fallback faces (DejaVu, Bitstream Vera derived licence).
const DEJAVU_SANS: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");
const DEJAVU_SANS_BOLD: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");

/// Family used when nothing else is configured.
pub const DEFAULT_FONT_FAMILY: &str = "OpenSans-Regular";

/// Built-in families: (name, average char width in em, bold face).
///
/// Widths are those of the embedded face each family is drawn with.
const BUILTIN_FAMILIES: [(&str, f32, bool); 8] = [
    ("OpenSans-Regular", 0.55, false),
    ("JosefinSans-Regular", 0.55, false),
    ("Roboto-Bold", 0.62, true),
    ("Quicksand-Bold", 0.62, true),
    ("AlexBrush-Regular", 0.55, false),
    ("AmaticSC-Regular", 0.55, false),
    ("DejaVuSans", 0.55, false),
    ("DejaVuSans-Bold", 0.62, true),
];

/// Names of the embedded faces a configuration may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedFace {
    Regular,
    Bold,
}

impl EmbeddedFace {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dejavu-sans" | "regular" => Some(Self::Regular),
            "dejavu-sans-bold" | "bold" => Some(Self::Bold),
            _ => None,
        }
    }

    fn data(&self) -> &'static [u8] {
        match self {
            Self::Regular => DEJAVU_SANS,
            Self::Bold => DEJAVU_SANS_BOLD,
        }
    }
}

/// Glyph source for one family.
#[derive(Clone)]
pub enum FontFace {
    Ready(FontArc),
    /// Registered but not loadable; carries the reason.
    Unavailable(String),
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

impl FontFace {
    pub fn embedded(face: EmbeddedFace) -> Self {
        match FontArc::try_from_slice(face.data()) {
            Ok(font) => Self::Ready(font),
            Err(e) => Self::Unavailable(format!("embedded face is corrupt: {}", e)),
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        match FontArc::try_from_vec(data) {
            Ok(font) => Self::Ready(font),
            Err(e) => Self::Unavailable(format!("invalid font data: {}", e)),
        }
    }

    /// Load a face from disk. Failures are recorded, not returned, so a
    /// missing asset surfaces at render time.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(data) => Self::from_bytes(data),
            Err(e) => Self::Unavailable(format!("cannot read {}: {}", path.display(), e)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontEntry {
    pub avg_char_width: f32,
    pub face: FontFace,
}

/// Closed set of supported families.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    entries: BTreeMap<String, FontEntry>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontRegistry {
    /// Registry with no families. Must be filled before use.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The style editor's families, rendered with embedded stand-in faces.
    pub fn builtin() -> Self {
        let regular = FontFace::embedded(EmbeddedFace::Regular);
        let bold = FontFace::embedded(EmbeddedFace::Bold);

        let mut registry = Self::empty();
        for (name, width, is_bold) in BUILTIN_FAMILIES {
            let face = if is_bold { bold.clone() } else { regular.clone() };
            registry.register(name, width, face);
        }
        registry
    }

    /// Add or replace a family.
    pub fn register(&mut self, family: impl Into<String>, avg_char_width: f32, face: FontFace) {
        let family = family.into();
        if let FontFace::Unavailable(reason) = &face {
            tracing::warn!(
                family = %family,
                reason = %reason,
                "Font family registered without a usable face"
            );
        }
        self.entries.insert(
            family,
            FontEntry {
                avg_char_width,
                face,
            },
        );
    }

    pub fn contains(&self, family: &str) -> bool {
        self.entries.contains_key(family)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, family: &str) -> Option<&FontEntry> {
        self.entries.get(family)
    }

    /// Average character width (em fraction) for the width heuristic.
    pub fn avg_char_width(&self, family: &str) -> Option<f32> {
        self.entries.get(family).map(|e| e.avg_char_width)
    }

    /// Resolve a family to a renderable font.
    ///
    /// Unknown families are a style error; known families without a face
    /// are a render failure.
    pub fn resolve(&self, family: &str) -> Result<FontArc, OverlayError> {
        let entry = self.entries.get(family).ok_or_else(|| {
            OverlayError::invalid_style(format!("Unsupported font family '{}'", family))
        })?;
        match &entry.face {
            FontFace::Ready(font) => Ok(font.clone()),
            FontFace::Unavailable(reason) => Err(OverlayError::render_failure(format!(
                "Font family '{}' could not be loaded: {}",
                family, reason
            ))),
        }
    }
}
