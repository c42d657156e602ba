//! Raster drawing surface.
//!
//! A thin canvas-style wrapper over a `tiny_skia::Pixmap`: solid fills,
//! anti-aliased circles and strokes, scaled image draws and coverage masks
//! for text. Every operation composites with source-over, matching a 2D
//! canvas context in its default state.

use image::{Rgba, RgbaImage};
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect as SkiaRect,
    Stroke, Transform,
};

use crate::error::{CollageError, CollageResult};
use crate::layout::Rect;

/// An RGBA drawing surface.
pub struct Surface {
    pixmap: Pixmap,
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

/// Convert a straight-alpha image into a premultiplied pixmap.
fn pixmap_from_rgba(image: &RgbaImage) -> CollageResult<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height()).ok_or_else(|| {
        CollageError::unsupported(format!(
            "cannot allocate {}x{} image surface",
            image.width(),
            image.height()
        ))
    })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

impl Surface {
    /// Allocate a transparent surface.
    ///
    /// Fails with [`CollageError::Unsupported`] when the size is zero or too
    /// large to allocate.
    pub fn new(width: u32, height: u32) -> CollageResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            CollageError::unsupported(format!("cannot allocate {}x{} drawing surface", width, height))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Replace every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if let Some(rect) = SkiaRect::from_xywh(x, y, width, height) {
            self.pixmap
                .fill_rect(rect, &solid(color), Transform::identity(), None);
        }
    }

    /// Fill a batch of non-overlapping circles in one pass.
    pub fn fill_circles(&mut self, centers: &[(f32, f32)], radius: f32, color: Color) {
        let mut builder = PathBuilder::new();
        for &(cx, cy) in centers {
            builder.push_circle(cx, cy, radius);
        }
        if let Some(path) = builder.finish() {
            self.pixmap.fill_path(
                &path,
                &solid(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    /// Stroke a single line segment with butt caps.
    pub fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.0, from.1);
        builder.line_to(to.0, to.1);
        if let Some(path) = builder.finish() {
            let stroke = Stroke {
                width,
                ..Default::default()
            };
            self.pixmap
                .stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
        }
    }

    /// Draw `image` stretched to fill `dest` exactly.
    pub fn draw_image(&mut self, image: &RgbaImage, dest: Rect) -> CollageResult<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CollageError::render("cannot draw an empty image"));
        }
        let source = pixmap_from_rgba(image)?;
        let sx = dest.width / image.width() as f32;
        let sy = dest.height / image.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &paint,
            Transform::from_row(sx, 0.0, 0.0, sy, dest.x, dest.y),
            None,
        );
        Ok(())
    }

    /// Composite `color` through an 8-bit coverage mask whose top-left
    /// corner lands at `(x, y)`.
    pub fn fill_mask(&mut self, x: i32, y: i32, width: u32, height: u32, coverage: &[u8], color: Color) {
        let Some(mut layer) = Pixmap::new(width, height) else {
            return;
        };
        let base = color.to_color_u8();
        for (dst, &c) in layer.pixels_mut().iter_mut().zip(coverage) {
            let alpha = (base.alpha() as u16 * c as u16 + 127) / 255;
            *dst = ColorU8::from_rgba(base.red(), base.green(), base.blue(), alpha as u8).premultiply();
        }
        self.pixmap.draw_pixmap(
            x,
            y,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Straight-alpha RGBA value of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba([c.red(), c.green(), c.blue(), c.alpha()]))
    }

    /// Raw premultiplied bytes, row-major RGBA.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Finish drawing and convert to a straight-alpha image.
    pub fn into_rgba(self) -> RgbaImage {
        let mut out = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}
