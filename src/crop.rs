//! # Crop Transform
//!
//! Turns a user-selected rectangle on a source photo into a [`CroppedImage`].
//!
//! Coordinates are in the source image's natural pixel space. The crop UI
//! produces square rectangles, but nothing here assumes it: a [`CropSpec`] is
//! an arbitrary axis-aligned rectangle, clipped against the source bounds.
//! Pixels of the output that fall outside the source stay transparent, so the
//! output is always exactly `width × height`.
//!
//! ## Example
//!
//! ```
//! use collagist::crop::{crop, CropSpec, SourceImage};
//! use image::{DynamicImage, RgbImage};
//!
//! let source = SourceImage::new("a", DynamicImage::ImageRgb8(RgbImage::new(640, 480)));
//! let spec = CropSpec::from_zoom(640, 480, 2.0, (0.5, 0.5));
//! assert_eq!(spec, CropSpec::new(200.0, 120.0, 240.0, 240.0));
//!
//! let cropped = crop(&source, &spec)?;
//! assert_eq!(cropped.dimensions(), Some((240, 240)));
//! # Ok::<(), collagist::CollageError>(())
//! ```

use image::{DynamicImage, RgbaImage, codecs::jpeg::JpegEncoder, imageops};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{CollageError, CollageResult};

/// JPEG quality used when a cropped image is persisted.
pub const PERSIST_QUALITY: u8 = 95;

/// Zoom range offered by the crop UI.
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

/// A decoded source photo plus its stable identifier.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: String,
    image: Arc<DynamicImage>,
}

impl SourceImage {
    pub fn new(id: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            id: id.into(),
            image: Arc::new(image),
        }
    }

    /// Decode an uploaded file (any format the `image` crate understands).
    pub fn decode(id: impl Into<String>, bytes: &[u8]) -> CollageResult<Self> {
        let id = id.into();
        let image = image::load_from_memory(bytes)
            .map_err(|e| CollageError::decode(format!("image '{}': {}", id, e)))?;
        Ok(Self::new(id, image))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Crop rectangle in natural pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A crop rectangle snapped to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CropSpec {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square selection the way the zoom cropper builds it.
    ///
    /// The square side is `min(width, height) / zoom`, centered on the
    /// normalized focal point `center` and shifted back inside the image when
    /// it would overhang. Zoom is clamped to the UI range of 1-3.
    pub fn from_zoom(natural_width: u32, natural_height: u32, zoom: f64, center: (f64, f64)) -> Self {
        let zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            MIN_ZOOM
        };
        let w = natural_width as f64;
        let h = natural_height as f64;
        let side = (w.min(h) / zoom).round();

        let place = |extent: f64, focus: f64| {
            let focus = if focus.is_finite() {
                focus.clamp(0.0, 1.0)
            } else {
                0.5
            };
            (extent * focus - side / 2.0).round().clamp(0.0, extent - side)
        };

        Self::new(place(w, center.0), place(h, center.1), side, side)
    }

    /// Whether the rectangle lies inside `[0, width] × [0, height]`.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        let fits = |pos: f64, size: f64, extent: u32| {
            pos.is_finite() && size.is_finite() && pos >= 0.0 && size > 0.0 && pos + size <= extent as f64
        };
        fits(self.x, self.width, width) && fits(self.y, self.height, height)
    }

    /// Snap to whole pixels. Rectangles narrower than half a pixel snap to 0.
    pub fn snap(&self) -> PixelRect {
        let size = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v.round().min(u32::MAX as f64) as u32
            } else {
                0
            }
        };
        let pos = |v: f64| if v.is_finite() { v.round() as i64 } else { 0 };
        PixelRect {
            x: pos(self.x),
            y: pos(self.y),
            width: size(self.width),
            height: size(self.height),
        }
    }
}

impl PixelRect {
    /// Intersection with `[0, width) × [0, height)`, as `(x, y, w, h)` in
    /// source coordinates. `None` when empty.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width as i64).min(width as i64);
        let y1 = (self.y + self.height as i64).min(height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Pixel storage behind a [`CroppedImage`].
#[derive(Debug, Clone)]
pub enum ImageAsset {
    /// Lossless in-memory raster, straight from the crop.
    Raster(Arc<RgbaImage>),
    /// Compressed file bytes that must be decoded before drawing.
    Encoded(Arc<Vec<u8>>),
}

/// The frozen result of applying a [`CropSpec`] to a source photo.
#[derive(Debug, Clone)]
pub struct CroppedImage {
    id: String,
    asset: ImageAsset,
    crop: CropSpec,
}

impl CroppedImage {
    pub fn from_raster(id: impl Into<String>, raster: RgbaImage, crop: CropSpec) -> Self {
        Self {
            id: id.into(),
            asset: ImageAsset::Raster(Arc::new(raster)),
            crop,
        }
    }

    pub fn from_encoded(id: impl Into<String>, bytes: Vec<u8>, crop: CropSpec) -> Self {
        Self {
            id: id.into(),
            asset: ImageAsset::Encoded(Arc::new(bytes)),
            crop,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn crop_spec(&self) -> &CropSpec {
        &self.crop
    }

    pub fn asset(&self) -> &ImageAsset {
        &self.asset
    }

    /// Pixel dimensions, when known without decoding.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match &self.asset {
            ImageAsset::Raster(raster) => Some(raster.dimensions()),
            ImageAsset::Encoded(_) => None,
        }
    }

    /// Encode as a JPEG at [`PERSIST_QUALITY`].
    ///
    /// Already-encoded assets are returned as-is.
    pub fn to_jpeg(&self) -> CollageResult<Vec<u8>> {
        match &self.asset {
            ImageAsset::Encoded(bytes) => Ok(bytes.as_ref().clone()),
            ImageAsset::Raster(raster) => {
                let rgb = DynamicImage::ImageRgba8(raster.as_ref().clone()).to_rgb8();
                let mut out = Vec::new();
                JpegEncoder::new_with_quality(&mut out, PERSIST_QUALITY)
                    .encode_image(&rgb)
                    .map_err(|e| CollageError::encode(format!("image '{}': {}", self.id, e)))?;
                Ok(out)
            }
        }
    }

    /// Reusable, compressed form of this image.
    pub fn persist(&self) -> CollageResult<CroppedImage> {
        Ok(Self::from_encoded(self.id.clone(), self.to_jpeg()?, self.crop))
    }

    /// Resolve to a drawable raster.
    ///
    /// Encoded assets are decoded on the blocking pool; the caller awaits the
    /// result before touching the next image.
    pub async fn decode(&self) -> CollageResult<Arc<RgbaImage>> {
        match &self.asset {
            ImageAsset::Raster(raster) => Ok(raster.clone()),
            ImageAsset::Encoded(bytes) => {
                let bytes = bytes.clone();
                let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
                    .await
                    .map_err(|e| CollageError::decode(format!("image '{}': {}", self.id, e)))?
                    .map_err(|e| CollageError::decode(format!("image '{}': {}", self.id, e)))?;
                Ok(Arc::new(decoded.to_rgba8()))
            }
        }
    }
}

/// Apply `spec` to `image`.
///
/// The output is exactly the snapped `width × height` of the spec. Fails with
/// a validation error when the rectangle does not overlap the image or is
/// larger than it.
pub fn crop(image: &SourceImage, spec: &CropSpec) -> CollageResult<CroppedImage> {
    let rect = spec.snap();
    if rect.width > image.width() || rect.height > image.height() {
        return Err(CollageError::validation(format!(
            "crop {}x{} is larger than image '{}' ({}x{})",
            rect.width,
            rect.height,
            image.id(),
            image.width(),
            image.height()
        )));
    }
    let (sx, sy, sw, sh) = rect
        .clip(image.width(), image.height())
        .ok_or_else(|| {
            CollageError::validation(format!(
                "crop {:?} does not overlap image '{}' ({}x{})",
                spec,
                image.id(),
                image.width(),
                image.height()
            ))
        })?;

    let region = image.image().crop_imm(sx, sy, sw, sh).to_rgba8();
    let raster = if sw == rect.width && sh == rect.height {
        region
    } else {
        let mut canvas = RgbaImage::new(rect.width, rect.height);
        imageops::replace(&mut canvas, &region, sx as i64 - rect.x, sy as i64 - rect.y);
        canvas
    };

    debug!(
        id = image.id(),
        width = raster.width(),
        height = raster.height(),
        "cropped image"
    );
    Ok(CroppedImage::from_raster(image.id(), raster, *spec))
}

/// Crop several images in parallel.
///
/// Results come back in input order, one per image, so a failure for one
/// image leaves the others intact.
pub fn crop_all(jobs: &[(SourceImage, CropSpec)]) -> Vec<CollageResult<CroppedImage>> {
    jobs.par_iter()
        .map(|(image, spec)| crop(image, spec))
        .collect()
}
