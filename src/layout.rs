//! # Collage Layout
//!
//! Geometry shared by every rendering path. Both the rasterizer and the live
//! preview call [`plan`] so their proportions cannot drift apart.
//!
//! ```text
//!   ┌──────────────────────────┐  ─┬─ border
//!   │  ┌────────────────────┐  │   │
//!   │  │      image 0       │  │   cell (square)
//!   │  └────────────────────┘  │  ─┼─ gap (= border)
//!   │  ┌────────────────────┐  │   │
//!   │  │      image 1       │  │   cell
//!   │  └────────────────────┘  │   │
//!   │        text band         │   2 × font size
//!   └──────────────────────────┘  ─┴─ border
//! ```
//!
//! With the text at the top, the band sits above the first image instead.

use crate::design::{DesignConfig, TextPosition};
use crate::error::{CollageError, CollageResult};

/// Nominal collage width in logical pixels. Output resolution is controlled
/// only by the render scale.
pub const BASE_LOGICAL_WIDTH: f32 = 400.0;

/// Text band height as a multiple of the scaled font size.
pub const TEXT_BAND_FACTOR: f32 = 2.0;

/// Largest raster side, in output pixels, a plan may allocate.
pub const MAX_RASTER_SIDE: u32 = 16_384;

/// Derived geometry for one render call, in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    pub image_count: usize,
    pub scale: f32,
    pub total_width: f32,
    pub total_height: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    pub border: f32,
    pub gap: f32,
    pub font_size: f32,
    pub text_band_height: f32,
}

/// Axis-aligned rectangle in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Compute the geometry for `image_count` images at `scale`.
pub fn plan(image_count: usize, config: &DesignConfig, scale: f32) -> CollageResult<RenderPlan> {
    if image_count == 0 {
        return Err(CollageError::validation("a collage needs at least one image"));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(CollageError::validation(format!(
            "scale must be a positive number, got {}",
            scale
        )));
    }
    if !config.border_thickness.is_finite() || config.border_thickness < 0.0 {
        return Err(CollageError::validation(format!(
            "borderThickness must be a non-negative number, got {}",
            config.border_thickness
        )));
    }
    if !config.text.font_size.is_finite() || config.text.font_size <= 0.0 {
        return Err(CollageError::validation(format!(
            "text.fontSize must be positive, got {}",
            config.text.font_size
        )));
    }

    let border = config.border_thickness * scale;
    let gap = border;
    let total_width = BASE_LOGICAL_WIDTH * scale;
    let cell = total_width - 2.0 * border;
    if cell <= 0.0 {
        return Err(CollageError::validation(format!(
            "borderThickness {} leaves no room for images",
            config.border_thickness
        )));
    }

    let font_size = config.text.font_size * scale;
    let text_band_height = font_size * TEXT_BAND_FACTOR;
    let n = image_count as f32;
    let total_height = 2.0 * border + n * cell + (n - 1.0) * gap + text_band_height;

    Ok(RenderPlan {
        image_count,
        scale,
        total_width,
        total_height,
        cell_width: cell,
        cell_height: cell,
        border,
        gap,
        font_size,
        text_band_height,
    })
}

impl RenderPlan {
    /// Integer surface size. Fractional sizes truncate, like a canvas.
    ///
    /// Fails when either side exceeds [`MAX_RASTER_SIDE`].
    pub fn pixel_size(&self) -> CollageResult<(u32, u32)> {
        let limit = MAX_RASTER_SIDE as f32;
        if !(self.total_width <= limit && self.total_height <= limit) {
            return Err(CollageError::validation(format!(
                "collage of {}x{} px exceeds the {} px raster limit",
                self.total_width, self.total_height, MAX_RASTER_SIDE
            )));
        }
        Ok((self.total_width as u32, self.total_height as u32))
    }

    /// Y coordinate where the first image starts.
    pub fn images_origin(&self, position: TextPosition) -> f32 {
        match position {
            TextPosition::Top => self.border + self.text_band_height,
            TextPosition::Bottom => self.border,
        }
    }

    /// Cell occupied by image `index`.
    pub fn image_rect(&self, index: usize, position: TextPosition) -> Rect {
        Rect {
            x: self.border,
            y: self.images_origin(position) + index as f32 * (self.cell_height + self.gap),
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    /// Horizontal center and baseline of the text overlay.
    pub fn text_anchor(&self, position: TextPosition) -> (f32, f32) {
        let baseline = match position {
            TextPosition::Top => self.border + self.font_size,
            TextPosition::Bottom => self.total_height - self.border - 0.2 * self.font_size,
        };
        (self.total_width / 2.0, baseline)
    }

    /// Band reserved for the text overlay.
    pub fn text_band(&self, position: TextPosition) -> Rect {
        let y = match position {
            TextPosition::Top => self.border,
            TextPosition::Bottom => self.total_height - self.border - self.text_band_height,
        };
        Rect {
            x: self.border,
            y,
            width: self.cell_width,
            height: self.text_band_height,
        }
    }
}
