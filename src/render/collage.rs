//! The authoritative rendering path: cropped photos + design in, pixels out.
//!
//! Drawing order on a fresh surface:
//!
//! 1. background fill
//! 2. pattern over the whole surface
//! 3. caption, when positioned at the top
//! 4. each image, in list order, stretched into its square cell
//! 5. caption, when positioned at the bottom
//!
//! The caption band is reserved even when the caption is empty, so the
//! output size depends only on the image count, border, font size and scale.

use image::RgbaImage;
use tracing::{debug, info};

use super::patterns;
use super::surface::Surface;
use super::text::{self, FontBook};
use crate::color::pattern_ink;
use crate::crop::CroppedImage;
use crate::design::{DesignConfig, TextPosition};
use crate::error::{CollageError, CollageResult};
use crate::layout::{RenderPlan, plan};

/// Scale used for downloadable exports.
pub const EXPORT_SCALE: f32 = 4.0;

/// Supported photo counts.
pub const MIN_IMAGES: usize = 2;
pub const MAX_IMAGES: usize = 3;

/// Bitmap output of one render.
///
/// Encoders take it by value, so each raster is encoded at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedRaster {
    image: RgbaImage,
}

impl FinishedRaster {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Straight-alpha RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Reject image counts outside the supported range.
pub fn check_image_count(count: usize) -> CollageResult<()> {
    if !(MIN_IMAGES..=MAX_IMAGES).contains(&count) {
        return Err(CollageError::validation(format!(
            "a collage takes {} to {} images, got {}",
            MIN_IMAGES, MAX_IMAGES, count
        )));
    }
    Ok(())
}

/// Compose `images` with `config` at `scale`.
///
/// Images are decoded and drawn strictly in list order; the call suspends
/// only while an encoded image is being decoded. A decode failure aborts the
/// whole render with [`CollageError::Render`].
pub async fn render(
    images: &[CroppedImage],
    config: &DesignConfig,
    scale: f32,
    fonts: &FontBook,
) -> CollageResult<FinishedRaster> {
    check_image_count(images.len())?;
    config.validate()?;

    let caption = &config.text;
    let font = if caption.has_content() {
        let font = fonts.resolve(&caption.font_family).ok_or_else(|| {
            CollageError::unsupported(format!(
                "no font available for '{}'",
                caption.font_family
            ))
        })?;
        Some(font)
    } else {
        None
    };

    let plan = plan(images.len(), config, scale)?;
    let (width, height) = plan.pixel_size()?;
    let mut surface = Surface::new(width, height)?;
    debug!(width, height, images = images.len(), "rendering collage");

    surface.fill(config.background_rgb().to_skia());
    let ink = pattern_ink(&config.background_color);
    patterns::paint(
        &mut surface,
        width as f32,
        height as f32,
        config.pattern,
        config.pattern_scale,
        scale,
        ink.soft.to_skia(),
        ink.strong.to_skia(),
    );

    let draw_caption = |surface: &mut Surface, position: TextPosition| {
        if let Some(font) = font {
            if caption.position == position {
                let (x, baseline) = plan.text_anchor(position);
                text::draw_text(
                    surface,
                    font,
                    &caption.content,
                    plan.font_size,
                    x,
                    baseline,
                    config.text_rgb().to_skia(),
                );
            }
        }
    };

    draw_caption(&mut surface, TextPosition::Top);
    draw_images(&mut surface, &plan, images, caption.position).await?;
    draw_caption(&mut surface, TextPosition::Bottom);

    info!(
        width,
        height,
        images = images.len(),
        pattern = config.pattern.name(),
        scale,
        "collage rendered"
    );
    Ok(FinishedRaster::new(surface.into_rgba()))
}

async fn draw_images(
    surface: &mut Surface,
    plan: &RenderPlan,
    images: &[CroppedImage],
    position: TextPosition,
) -> CollageResult<()> {
    for (index, image) in images.iter().enumerate() {
        let raster = image.decode().await.map_err(|e| {
            CollageError::render(format!("image {} ('{}') failed to load: {}", index, image.id(), e))
        })?;
        surface.draw_image(&raster, plan.image_rect(index, position))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropSpec;
    use crate::design::PatternKind;
    use crate::render::text::tests::system_fonts;
    use image::Rgba;

    fn solid(id: &str, color: [u8; 4], size: u32) -> CroppedImage {
        let raster = RgbaImage::from_pixel(size, size, Rgba(color));
        CroppedImage::from_raster(id, raster, CropSpec::new(0.0, 0.0, size as f64, size as f64))
    }

    fn plain_config() -> DesignConfig {
        DesignConfig {
            pattern: PatternKind::None,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_rejects_wrong_image_count() {
        let fonts = FontBook::empty();
        let one = vec![solid("a", [255, 0, 0, 255], 8)];
        let result = render(&one, &plain_config(), 1.0, &fonts).await;
        assert!(matches!(result, Err(CollageError::Validation(_))));

        let four: Vec<_> = (0..4).map(|i| solid(&i.to_string(), [0, 0, 0, 255], 8)).collect();
        let result = render(&four, &plain_config(), 1.0, &fonts).await;
        assert!(matches!(result, Err(CollageError::Validation(_))));
    }

    #[tokio::test]
    async fn test_layout_of_two_images() {
        let fonts = FontBook::empty();
        let images = vec![solid("red", [255, 0, 0, 255], 16), solid("blue", [0, 0, 255, 255], 16)];
        let raster = render(&images, &plain_config(), 1.0, &fonts).await.unwrap();
        assert_eq!((raster.width(), raster.height()), (400, 824));

        let px = |x, y| *raster.image().get_pixel(x, y);
        let close = |p: Rgba<u8>, q: [u8; 4]| p.0.iter().zip(q).all(|(a, b)| (*a as i32 - b as i32).abs() <= 2);
        // Border
        assert_eq!(px(10, 10), Rgba([255, 255, 255, 255]));
        // Cell centers: 24 + 176 and 24 + 352 + 24 + 176
        assert!(close(px(200, 200), [255, 0, 0, 255]), "got {:?}", px(200, 200));
        assert!(close(px(200, 576), [0, 0, 255, 255]), "got {:?}", px(200, 576));
        // Gap between the cells
        assert_eq!(px(200, 388), Rgba([255, 255, 255, 255]));
        // Empty caption band at the bottom
        assert_eq!(px(200, 790), Rgba([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn test_top_caption_shifts_images() {
        let fonts = FontBook::empty();
        let mut config = plain_config();
        config.text.position = TextPosition::Top;
        let images = vec![solid("a", [255, 0, 0, 255], 4), solid("b", [255, 0, 0, 255], 4)];
        let raster = render(&images, &config, 1.0, &fonts).await.unwrap();
        // Band of 48px above the first cell, which starts at y = 72
        assert_eq!(*raster.image().get_pixel(200, 60), Rgba([255, 255, 255, 255]));
        let p = raster.image().get_pixel(200, 80);
        assert!(p[0] > 250 && p[1] < 5, "got {:?}", p);
    }

    #[tokio::test]
    async fn test_caption_without_font_is_unsupported() {
        let fonts = FontBook::empty();
        let mut config = plain_config();
        config.text.content = "Hi".to_string();
        let images = vec![solid("a", [0, 0, 0, 255], 4), solid("b", [0, 0, 0, 255], 4)];
        let result = render(&images, &config, 1.0, &fonts).await;
        assert!(matches!(result, Err(CollageError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_broken_image_aborts_render() {
        let fonts = FontBook::empty();
        let broken = CroppedImage::from_encoded("broken", vec![0xde, 0xad], CropSpec::new(0.0, 0.0, 1.0, 1.0));
        let images = vec![solid("a", [0, 0, 0, 255], 4), broken];
        let result = render(&images, &plain_config(), 1.0, &fonts).await;
        assert!(matches!(result, Err(CollageError::Render(_))));
    }

    #[tokio::test]
    async fn test_caption_is_drawn_in_band() {
        let Some(fonts) = system_fonts() else {
            return;
        };
        let mut config = plain_config();
        config.text.content = "Party!".to_string();
        let images = vec![solid("a", [255, 0, 0, 255], 4), solid("b", [255, 0, 0, 255], 4)];
        let raster = render(&images, &config, 1.0, &fonts).await.unwrap();

        let band_top = 824 - 24 - 48;
        let inked = (band_top..824 - 24)
            .flat_map(|y| (24..376).map(move |x| (x, y)))
            .filter(|&(x, y)| *raster.image().get_pixel(x, y) != Rgba([255, 255, 255, 255]))
            .count();
        assert!(inked > 0);
    }
}
