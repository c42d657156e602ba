//! # Design Configuration
//!
//! The user-editable look of a collage: border, background, pattern and text
//! overlay. All dimensions are logical pixels; renderers multiply them by an
//! explicit scale and never mutate the stored config.
//!
//! The JSON shape matches what the browser editor produces:
//!
//! ```
//! use collagist::design::{DesignConfig, PatternKind, TextPosition};
//!
//! let config: DesignConfig = serde_json::from_str(r##"{
//!     "borderThickness": 12,
//!     "backgroundColor": "#1e1e1e",
//!     "pattern": "checkers",
//!     "text": { "content": "Hi!", "position": "top" }
//! }"##).unwrap();
//!
//! assert_eq!(config.pattern, PatternKind::Checkers);
//! assert_eq!(config.pattern_scale, 20.0); // default
//! assert_eq!(config.text.position, TextPosition::Top);
//! assert_eq!(config.text.font_size, 24.0); // default
//! ```

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::{CollageError, CollageResult};

/// Smallest accepted `patternScale`.
pub const MIN_PATTERN_SCALE: f32 = 10.0;
/// Largest accepted `patternScale`.
pub const MAX_PATTERN_SCALE: f32 = 100.0;
/// Smallest accepted caption `fontSize`.
pub const MIN_FONT_SIZE: f32 = 12.0;
/// Largest accepted caption `fontSize`.
pub const MAX_FONT_SIZE: f32 = 120.0;
/// Practical cap on overlay text length, in UTF-16 code units.
pub const MAX_TEXT_UNITS: usize = 20;

/// Background texture kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    None,
    #[default]
    Dots,
    Lines,
    Grid,
    Checkers,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::None,
        PatternKind::Dots,
        PatternKind::Lines,
        PatternKind::Grid,
        PatternKind::Checkers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::None => "none",
            PatternKind::Dots => "dots",
            PatternKind::Lines => "lines",
            PatternKind::Grid => "grid",
            PatternKind::Checkers => "checkers",
        }
    }

    /// Look up a pattern by name (case insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// Which band of the collage holds the text overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    #[default]
    Bottom,
}

/// Text overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOverlay {
    pub content: String,
    /// Font size in logical pixels.
    pub font_size: f32,
    /// Hex text color.
    pub color: String,
    pub position: TextPosition,
    /// CSS font-family list, e.g. `"'Dancing Script', cursive"`.
    pub font_family: String,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 24.0,
            color: "#000000".to_string(),
            position: TextPosition::Bottom,
            font_family: "Inter, sans-serif".to_string(),
        }
    }
}

impl TextOverlay {
    /// True when there is visible text to draw.
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Full design configuration for one collage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignConfig {
    /// Gap around and between images, in logical pixels.
    pub border_thickness: f32,
    /// Hex background fill.
    pub background_color: String,
    pub pattern: PatternKind,
    /// Pattern spacing in logical pixels (10-100).
    pub pattern_scale: f32,
    pub text: TextOverlay,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            border_thickness: 24.0,
            background_color: "#ffffff".to_string(),
            pattern: PatternKind::Dots,
            pattern_scale: 20.0,
            text: TextOverlay::default(),
        }
    }
}

impl DesignConfig {
    /// Check every field a renderer depends on.
    ///
    /// Geometry that depends on the image count and scale is checked by
    /// [`crate::layout::plan`].
    pub fn validate(&self) -> CollageResult<()> {
        if !self.border_thickness.is_finite() || self.border_thickness < 0.0 {
            return Err(CollageError::validation(format!(
                "borderThickness must be a non-negative number, got {}",
                self.border_thickness
            )));
        }
        Rgb::parse(&self.background_color)?;
        if !(MIN_PATTERN_SCALE..=MAX_PATTERN_SCALE).contains(&self.pattern_scale) {
            return Err(CollageError::validation(format!(
                "patternScale must be within {}..={}, got {}",
                MIN_PATTERN_SCALE, MAX_PATTERN_SCALE, self.pattern_scale
            )));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.text.font_size) {
            return Err(CollageError::validation(format!(
                "text.fontSize must be within {}..={}, got {}",
                MIN_FONT_SIZE, MAX_FONT_SIZE, self.text.font_size
            )));
        }
        Rgb::parse(&self.text.color)?;
        Ok(())
    }

    /// Background color, assuming [`DesignConfig::validate`] passed.
    pub fn background_rgb(&self) -> Rgb {
        Rgb::parse_lossy(&self.background_color)
    }

    /// Text color, assuming [`DesignConfig::validate`] passed.
    pub fn text_rgb(&self) -> Rgb {
        Rgb::parse_lossy(&self.text.color)
    }

    /// Copy of this config with the overlay text truncated to the editor's
    /// length cap.
    pub fn with_capped_text(&self) -> Self {
        let mut config = self.clone();
        let mut units = 0;
        config.text.content = self
            .text
            .content
            .chars()
            .take_while(|c| {
                units += c.len_utf16();
                units <= MAX_TEXT_UNITS
            })
            .collect();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DesignConfig::default();
        assert_eq!(config.border_thickness, 24.0);
        assert_eq!(config.background_color, "#ffffff");
        assert_eq!(config.pattern, PatternKind::Dots);
        assert_eq!(config.pattern_scale, 20.0);
        assert_eq!(config.text.font_size, 24.0);
        assert_eq!(config.text.position, TextPosition::Bottom);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_uses_camel_case() {
        let config = DesignConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["borderThickness"], 24.0);
        assert_eq!(json["patternScale"], 20.0);
        assert_eq!(json["pattern"], "dots");
        assert_eq!(json["text"]["fontFamily"], "Inter, sans-serif");
        assert_eq!(json["text"]["position"], "bottom");

        let back: DesignConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: DesignConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DesignConfig::default());
    }

    #[test]
    fn test_pattern_by_name() {
        assert_eq!(PatternKind::by_name("GRID"), Some(PatternKind::Grid));
        assert_eq!(PatternKind::by_name("none"), Some(PatternKind::None));
        assert_eq!(PatternKind::by_name("stripes"), None);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = DesignConfig::default();
        config.pattern_scale = 5.0;
        assert!(matches!(config.validate(), Err(CollageError::Validation(_))));

        let mut config = DesignConfig::default();
        config.border_thickness = -1.0;
        assert!(config.validate().is_err());

        let mut config = DesignConfig::default();
        config.background_color = "white".to_string();
        assert!(config.validate().is_err());

        let mut config = DesignConfig::default();
        config.text.font_size = 0.0;
        assert!(config.validate().is_err());

        for size in [11.0, 121.0, 1e9, f32::NAN] {
            let mut config = DesignConfig::default();
            config.text.font_size = size;
            assert!(
                matches!(config.validate(), Err(CollageError::Validation(_))),
                "fontSize {} accepted",
                size
            );
        }
        for size in [MIN_FONT_SIZE, MAX_FONT_SIZE] {
            let mut config = DesignConfig::default();
            config.text.font_size = size;
            assert!(config.validate().is_ok());
        }

        let mut config = DesignConfig::default();
        config.text.color = "#12345".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_text_cap_counts_utf16_units() {
        let mut config = DesignConfig::default();
        config.text.content = "abcdefghijklmnopqrstuvwxyz".to_string();
        assert_eq!(config.with_capped_text().text.content, "abcdefghijklmnopqrst");

        // Each emoji is two UTF-16 units
        config.text.content = "😀".repeat(15);
        assert_eq!(config.with_capped_text().text.content.chars().count(), 10);
    }
}
