//! # Rendering Module
//!
//! Rasterizes a collage onto an RGBA surface.
//!
//! ## Modules
//!
//! - [`surface`]: canvas-style drawing surface over `tiny_skia`
//! - [`patterns`]: procedural background textures (dots, lines, grid, checkers)
//! - [`text`]: font lookup and caption rasterization
//! - [`collage`]: full composition of images, pattern and caption
//!
//! ## Usage Example
//!
//! ```
//! use collagist::crop::{CropSpec, CroppedImage};
//! use collagist::design::DesignConfig;
//! use collagist::render::{collage, text::FontBook};
//! use image::{Rgba, RgbaImage};
//!
//! # tokio_test_block(async {
//! let photo = |id: &str| {
//!     let raster = RgbaImage::from_pixel(64, 64, Rgba([200, 80, 40, 255]));
//!     CroppedImage::from_raster(id, raster, CropSpec::new(0.0, 0.0, 64.0, 64.0))
//! };
//! let images = vec![photo("a"), photo("b")];
//!
//! let raster = collage::render(&images, &DesignConfig::default(), 1.0, &FontBook::empty())
//!     .await
//!     .unwrap();
//! assert_eq!((raster.width(), raster.height()), (400, 824));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod collage;
pub mod patterns;
pub mod surface;
pub mod text;
