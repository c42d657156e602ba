//! # Collage Tests
//!
//! End-to-end checks of the compositing engine: crop, layout, pattern,
//! caption and export working together through the public API.
//!
//! Caption tests need a TrueType font. They load whatever is installed under
//! `/usr/share/fonts` and are skipped when nothing is found.

use collagist::color::pattern_ink;
use collagist::crop::{CropSpec, CroppedImage, SourceImage, crop};
use collagist::design::{DesignConfig, PatternKind, TextPosition};
use collagist::export::{self, ExportFormat, PDF_JPEG_QUALITY};
use collagist::layout::plan;
use collagist::render::collage::{EXPORT_SCALE, render};
use collagist::render::text::FontBook;
use collagist::{CollageError, FinishedRaster};
use image::{DynamicImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn solid(id: &str, color: [u8; 4]) -> CroppedImage {
    let raster = RgbaImage::from_pixel(32, 32, Rgba(color));
    CroppedImage::from_raster(id, raster, CropSpec::new(0.0, 0.0, 32.0, 32.0))
}

fn photos(n: usize) -> Vec<CroppedImage> {
    let colors = [[220, 40, 40, 255], [40, 160, 60, 255], [40, 60, 200, 255]];
    (0..n).map(|i| solid(&format!("photo{}", i), colors[i])).collect()
}

fn config(pattern: PatternKind) -> DesignConfig {
    DesignConfig {
        border_thickness: 24.0,
        background_color: "#ffffff".to_string(),
        pattern,
        ..Default::default()
    }
}

fn system_fonts() -> Option<FontBook> {
    let book = FontBook::from_dirs(&[PathBuf::from("/usr/share/fonts")]);
    (!book.is_empty()).then_some(book)
}

fn near(p: &Rgba<u8>, expected: [u8; 3]) -> bool {
    (0..3).all(|i| (p[i] as i32 - expected[i] as i32).abs() <= 3)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// The embedded JPEG of a single-image PDF.
fn pdf_image_stream(pdf: &[u8]) -> &[u8] {
    let dict = find(pdf, b"/DCTDecode").unwrap();
    let start = dict + find(&pdf[dict..], b"stream\n").unwrap() + b"stream\n".len();
    let end = start + find(&pdf[start..], b"\nendstream").unwrap();
    &pdf[start..end]
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn scenario_two_images_at_export_scale() {
    let raster = render(&photos(2), &config(PatternKind::None), EXPORT_SCALE, &FontBook::empty())
        .await
        .unwrap();
    assert_eq!((raster.width(), raster.height()), (1600, 3304));

    let image = raster.image();
    // Border (96px) and caption band (192px) are plain background
    assert_eq!(*image.get_pixel(48, 48), WHITE);
    assert_eq!(*image.get_pixel(800, 3304 - 96 - 96), WHITE);
    // First cell spans 96..1504, second 1600..3008
    assert!(near(image.get_pixel(800, 800), [220, 40, 40]));
    assert!(near(image.get_pixel(800, 2304), [40, 160, 60]));
    assert_eq!(*image.get_pixel(800, 1552), WHITE);
}

#[tokio::test]
async fn scenario_three_images_height() {
    let raster = render(&photos(3), &config(PatternKind::None), EXPORT_SCALE, &FontBook::empty())
        .await
        .unwrap();
    assert_eq!((raster.width(), raster.height()), (1600, 4800));
    assert!(near(raster.image().get_pixel(800, 3904), [40, 60, 200]));
}

#[tokio::test]
async fn scenario_dots_grid_at_export_scale() {
    let mut design = config(PatternKind::Dots);
    design.pattern_scale = 10.0;
    let raster = render(&photos(2), &design, EXPORT_SCALE, &FontBook::empty())
        .await
        .unwrap();
    let image = raster.image();

    // Spacing 40, radius 6, grid anchored at the origin (inside the border)
    for (x, y) in [(0, 0), (40, 40), (80, 40), (40, 80)] {
        assert!(image.get_pixel(x, y)[0] < 230, "no dot at ({}, {})", x, y);
    }
    for (x, y) in [(20, 20), (60, 60), (47, 40), (40, 47)] {
        assert_eq!(*image.get_pixel(x, y), WHITE, "unexpected ink at ({}, {})", x, y);
    }
}

// ============================================================================
// INVARIANTS
// ============================================================================

#[test]
fn caption_band_is_reserved_without_text() {
    let empty = config(PatternKind::Dots);
    let mut captioned = empty.clone();
    captioned.text.content = "Hello".to_string();
    for n in [2, 3] {
        assert_eq!(
            plan(n, &empty, EXPORT_SCALE).unwrap().total_height,
            plan(n, &captioned, EXPORT_SCALE).unwrap().total_height
        );
    }
}

#[tokio::test]
async fn caption_does_not_change_raster_size() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let empty = config(PatternKind::Grid);
    let mut captioned = empty.clone();
    captioned.text.content = "Best night ever".to_string();

    let a = render(&photos(2), &empty, 1.0, &fonts).await.unwrap();
    let b = render(&photos(2), &captioned, 1.0, &fonts).await.unwrap();
    assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    assert_ne!(a.pixels(), b.pixels());
}

#[tokio::test]
async fn caption_position_moves_text() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let mut design = config(PatternKind::None);
    design.text.content = "Hi".to_string();
    design.text.color = "#000000".to_string();

    let inked_rows = |raster: &FinishedRaster| -> Vec<u32> {
        (0..raster.height())
            .filter(|&y| {
                (0..raster.width()).any(|x| {
                    let p = raster.image().get_pixel(x, y);
                    p[0] < 128 && p[1] < 128 && p[2] < 128
                })
            })
            .collect()
    };

    design.text.position = TextPosition::Top;
    let top = render(&photos(2), &design, 1.0, &fonts).await.unwrap();
    let rows = inked_rows(&top);
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|&y| y < 24 + 48));

    design.text.position = TextPosition::Bottom;
    let bottom = render(&photos(2), &design, 1.0, &fonts).await.unwrap();
    let rows = inked_rows(&bottom);
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|&y| y >= 824 - 24 - 48));
}

#[tokio::test]
async fn render_is_deterministic() {
    for pattern in PatternKind::ALL {
        let mut design = config(pattern);
        design.background_color = "#2b2d42".to_string();
        let a = render(&photos(3), &design, 1.5, &FontBook::empty()).await.unwrap();
        let b = render(&photos(3), &design, 1.5, &FontBook::empty()).await.unwrap();
        assert!(a == b, "{} render differs between runs", pattern.name());
    }
}

#[tokio::test]
async fn dark_background_gets_light_ink() {
    let mut design = config(PatternKind::Checkers);
    design.background_color = "#000000".to_string();
    assert_eq!(pattern_ink("#000000").strong.rgb.r, 255);

    let raster = render(&photos(2), &design, 1.0, &FontBook::empty()).await.unwrap();
    // Checker square at the origin: 30% white over black
    let p = raster.image().get_pixel(5, 5);
    assert!((p[0] as i32 - 77).abs() <= 2, "got {:?}", p);
    // Empty checker square
    assert_eq!(*raster.image().get_pixel(25, 5), Rgba([0, 0, 0, 255]));
}

#[tokio::test]
async fn reordering_swaps_cells() {
    let images = photos(2);
    let swapped = vec![images[1].clone(), images[0].clone()];
    let design = config(PatternKind::None);

    let a = render(&images, &design, 1.0, &FontBook::empty()).await.unwrap();
    let b = render(&swapped, &design, 1.0, &FontBook::empty()).await.unwrap();
    assert_eq!(a.image().get_pixel(200, 200), b.image().get_pixel(200, 576));
    assert_eq!(a.image().get_pixel(200, 576), b.image().get_pixel(200, 200));
}

// ============================================================================
// PIPELINE
// ============================================================================

#[tokio::test]
async fn crop_persist_render_pipeline() {
    let mut source = RgbaImage::from_pixel(300, 200, Rgba([250, 250, 250, 255]));
    for y in 50..150 {
        for x in 100..200 {
            source.put_pixel(x, y, Rgba([10, 10, 10, 255]));
        }
    }
    let source = SourceImage::new("photo", DynamicImage::ImageRgba8(source));

    let spec = CropSpec::from_zoom(300, 200, 2.0, (0.5, 0.5));
    assert_eq!(spec, CropSpec::new(100.0, 50.0, 100.0, 100.0));
    let persisted = crop(&source, &spec).unwrap().persist().unwrap();

    let images = vec![persisted.clone(), persisted];
    let raster = render(&images, &config(PatternKind::None), 1.0, &FontBook::empty())
        .await
        .unwrap();
    // The dark square fills both cells
    assert!(raster.image().get_pixel(200, 200)[0] < 40);
    assert!(raster.image().get_pixel(200, 576)[0] < 40);
}

#[tokio::test]
async fn undecodable_image_fails_whole_render() {
    let broken = CroppedImage::from_encoded("broken", b"GIF89a-but-not-really".to_vec(), CropSpec::new(0.0, 0.0, 1.0, 1.0));
    let images = vec![solid("ok", [0, 0, 0, 255]), broken];
    let err = render(&images, &config(PatternKind::Dots), 1.0, &FontBook::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, CollageError::Render(_)));
    assert!(err.to_string().contains("broken"));
}

#[tokio::test]
async fn image_count_is_validated_before_drawing() {
    for n in [0, 1] {
        let result = render(&photos(n), &config(PatternKind::None), 1.0, &FontBook::empty()).await;
        assert!(matches!(result, Err(CollageError::Validation(_))), "n = {}", n);
    }
}

#[tokio::test]
async fn png_and_pdf_embed_the_same_raster() {
    let raster = render(&photos(2), &config(PatternKind::Lines), 1.0, &FontBook::empty())
        .await
        .unwrap();

    let png = export::export(raster.clone(), ExportFormat::Png).unwrap();
    let pdf = export::export(raster.clone(), ExportFormat::Pdf).unwrap();
    assert_eq!(png.filename, "photobooth-collage.png");
    assert_eq!(pdf.filename, "photobooth-collage.pdf");

    let decoded = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.as_raw().as_slice(), raster.pixels());

    let expected_jpeg = export::encode_jpeg(&raster, PDF_JPEG_QUALITY).unwrap();
    assert!(pdf_image_stream(&pdf.bytes) == expected_jpeg.as_slice());
    assert!(find(&pdf.bytes, b"/MediaBox [0 0 400 824]").is_some());
}
