//! # Color Contrast
//!
//! Hex color parsing and pattern-ink derivation.
//!
//! The background texture is painted in an ink that contrasts with the
//! background: black on light backgrounds, white on dark ones. Two opacity
//! tiers are derived, `soft` for dots/lines/grid and `strong` for checkers.
//! Both rendering paths (rasterizer and live preview) go through
//! [`pattern_ink`] so they agree on the exact colors.
//!
//! ## Example
//!
//! ```
//! use collagist::color::{pattern_ink, Rgb};
//!
//! let ink = pattern_ink("#ffffff");
//! assert_eq!(ink.soft.rgb, Rgb::BLACK);
//! assert_eq!(ink.soft.to_css(), "rgba(0,0,0,0.15)");
//! ```

use crate::error::{CollageError, CollageResult};

/// Luminance above which a background counts as light.
pub const LIGHT_THRESHOLD: f64 = 0.5;

/// Opacity of the soft pattern ink (dots, lines, grid).
pub const SOFT_OPACITY: f32 = 0.15;

/// Opacity of the strong pattern ink (checkers).
pub const STRONG_OPACITY: f32 = 0.3;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` / `rrggbb` color, rejecting anything else.
    pub fn parse(hex: &str) -> CollageResult<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CollageError::validation(format!(
                "invalid hex color '{}': expected 6 hex digits",
                hex
            )));
        }
        Ok(Self::parse_lossy(digits))
    }

    /// Parse a hex color without failing.
    ///
    /// Channels that are missing or not valid hex decode as 0, so malformed
    /// input still yields a deterministic color.
    pub fn parse_lossy(hex: &str) -> Self {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |start: usize| {
            digits
                .get(start..start + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .unwrap_or(0)
        };
        Self::new(channel(0), channel(2), channel(4))
    }

    /// Perceived luminance in [0, 1] using the 0.299/0.587/0.114 weights.
    pub fn luminance(self) -> f64 {
        (0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64) / 255.0
    }

    /// `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}

/// A color with straight (non-premultiplied) opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ink {
    pub rgb: Rgb,
    pub alpha: f32,
}

impl Ink {
    pub const fn new(rgb: Rgb, alpha: f32) -> Self {
        Self { rgb, alpha }
    }

    /// CSS `rgba()` notation, as used by the live preview.
    pub fn to_css(self) -> String {
        format!(
            "rgba({},{},{},{})",
            self.rgb.r, self.rgb.g, self.rgb.b, self.alpha
        )
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        let mut color = self.rgb.to_skia();
        color.set_alpha(self.alpha.clamp(0.0, 1.0));
        color
    }
}

/// The two pattern inks derived from one background color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternInk {
    pub soft: Ink,
    pub strong: Ink,
}

/// Pick the ink pair for a given background luminance.
///
/// Uses a strict `>` comparison: a luminance of exactly 0.5 gets white ink.
pub fn ink_for_luminance(luminance: f64) -> PatternInk {
    let rgb = if luminance > LIGHT_THRESHOLD {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    };
    PatternInk {
        soft: Ink::new(rgb, SOFT_OPACITY),
        strong: Ink::new(rgb, STRONG_OPACITY),
    }
}

/// Derive the pattern inks for a background hex color.
pub fn pattern_ink(background: &str) -> PatternInk {
    ink_for_luminance(Rgb::parse_lossy(background).luminance())
}
