// Engine configuration
//
// Loaded from YAML with ${VAR} environment substitution. Every section is
// optional; an empty document yields the built-in defaults.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::analyzer::{PositionPriority, ScoringConfig};
use crate::compositor::fonts::{EmbeddedFace, FontFace, FontRegistry};
use crate::compositor::ShadowConfig;
use crate::error::OverlayError;
use crate::logging::LoggingConfig;
use crate::style::StyleConfig;

fn default_include_builtin_fonts() -> bool {
    true
}

fn default_analysis_max_dimension() -> u32 {
    crate::analyzer::DEFAULT_MAX_DIMENSION
}

/// An additional (or overriding) font family.
///
/// ```yaml
/// fonts:
///   - family: Brand-Regular
///     avg_char_width: 0.54
///     path: /usr/share/fonts/brand.ttf
///   - family: Poster
///     avg_char_width: 0.62
///     face: bold
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    pub family: String,

    /// Average glyph advance as a fraction of the font size
    pub avg_char_width: f32,

    /// Embedded face: "regular" or "bold" (default: regular)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,

    /// TTF/OTF file to load instead of an embedded face
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl FontConfig {
    fn load_face(&self) -> Result<FontFace, OverlayError> {
        match (&self.face, &self.path) {
            (Some(_), Some(_)) => Err(OverlayError::config(format!(
                "Font '{}' sets both face and path",
                self.family
            ))),
            (_, Some(path)) => Ok(FontFace::from_path(path)),
            (Some(name), None) => EmbeddedFace::from_name(name)
                .map(FontFace::embedded)
                .ok_or_else(|| {
                    OverlayError::config(format!(
                        "Font '{}' refers to unknown embedded face '{}'",
                        self.family, name
                    ))
                }),
            (None, None) => Ok(FontFace::embedded(EmbeddedFace::Regular)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Style applied when the caller does not pass one
    #[serde(default)]
    pub default_style: StyleConfig,

    /// Register the built-in families before `fonts` (default: true)
    #[serde(default = "default_include_builtin_fonts")]
    pub include_builtin_fonts: bool,

    #[serde(default)]
    pub fonts: Vec<FontConfig>,

    /// Tie-break order for equal scores
    #[serde(default)]
    pub position_priority: PositionPriority,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub shadow: ShadowConfig,

    /// Longest side of the analysis working copy (default: 1024)
    #[serde(default = "default_analysis_max_dimension")]
    pub analysis_max_dimension: u32,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_style: StyleConfig::default(),
            include_builtin_fonts: default_include_builtin_fonts(),
            fonts: Vec::new(),
            position_priority: PositionPriority::default(),
            scoring: ScoringConfig::default(),
            shadow: ShadowConfig::default(),
            analysis_max_dimension: default_analysis_max_dimension(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, OverlayError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| OverlayError::Internal(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                OverlayError::config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&substituted)
            .map_err(|e| OverlayError::config(format!("Invalid configuration: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, OverlayError> {
        let yaml = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            OverlayError::config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Build the font registry described by this configuration.
    pub fn font_registry(&self) -> Result<FontRegistry, OverlayError> {
        let mut registry = if self.include_builtin_fonts {
            FontRegistry::builtin()
        } else {
            FontRegistry::empty()
        };
        for font in &self.fonts {
            registry.register(font.family.clone(), font.avg_char_width, font.load_face()?);
        }
        Ok(registry)
    }

    pub fn validate(&self) -> Result<(), OverlayError> {
        self.scoring.validate()?;
        self.shadow.validate()?;

        if self.analysis_max_dimension < 3 {
            return Err(OverlayError::config(format!(
                "analysis_max_dimension must be at least 3, got {}",
                self.analysis_max_dimension
            )));
        }

        let mut seen = HashSet::new();
        for font in &self.fonts {
            if font.family.trim().is_empty() {
                return Err(OverlayError::config("Font family name cannot be empty"));
            }
            if !seen.insert(font.family.as_str()) {
                return Err(OverlayError::config(format!(
                    "Duplicate font family '{}'",
                    font.family
                )));
            }
            if !(font.avg_char_width.is_finite() && font.avg_char_width > 0.0) {
                return Err(OverlayError::config(format!(
                    "Font '{}' has invalid avg_char_width {}",
                    font.family, font.avg_char_width
                )));
            }
        }

        let registry = self.font_registry()?;
        if registry.is_empty() {
            return Err(OverlayError::config(
                "No font families configured (fonts is empty and include_builtin_fonts is false)",
            ));
        }

        // "auto" is resolved per image, so check the rest of the style with
        // a concrete stand-in colour
        let style = if self.default_style.has_auto_color() {
            self.default_style.clone().with_text_color("white")
        } else {
            self.default_style.clone()
        };
        style
            .validate(&registry)
            .map_err(|e| OverlayError::config(format!("default_style: {}", e)))?;

        Ok(())
    }
}
