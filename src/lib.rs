//! # Collagist - Photobooth Collage Compositor
//!
//! Collagist composes two or three photos into a single decorated photobooth
//! strip. It provides:
//!
//! - **Crop transform**: square (or arbitrary) selections on source photos
//! - **Procedural backgrounds**: dots, diagonal lines, grid and checkers,
//!   inked for contrast against the background color
//! - **Caption overlay**: one line of TrueType text above or below the photos
//! - **Two rendering paths** sharing one layout: a pixel-exact raster at any
//!   scale and a live HTML/CSS preview
//! - **Export**: PNG and single-page PDF
//!
//! ## Quick Start
//!
//! ```no_run
//! use collagist::{
//!     crop::{crop, CropSpec, SourceImage},
//!     design::DesignConfig,
//!     export::{export, ExportFormat},
//!     render::{collage, text::FontBook},
//! };
//!
//! # async fn example() -> collagist::CollageResult<()> {
//! let mut images = Vec::new();
//! for path in ["left.jpg", "right.jpg"] {
//!     let source = SourceImage::decode(path, &std::fs::read(path)?)?;
//!     let spec = CropSpec::from_zoom(source.width(), source.height(), 1.0, (0.5, 0.5));
//!     images.push(crop(&source, &spec)?);
//! }
//!
//! let fonts = FontBook::from_dirs(&[std::path::PathBuf::from("/usr/share/fonts")]);
//! let raster = collage::render(&images, &DesignConfig::default(), collage::EXPORT_SCALE, &fonts).await?;
//! let artifact = export(raster, ExportFormat::Png)?;
//! std::fs::write(&artifact.filename, &artifact.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`color`] | Hex colors and contrast-aware pattern ink |
//! | [`crop`] | Source images and the crop transform |
//! | [`design`] | User-editable design configuration |
//! | [`layout`] | Collage geometry shared by both rendering paths |
//! | [`render`] | Raster composition: surface, patterns, text |
//! | [`preview`] | HTML/CSS live preview |
//! | [`export`] | PNG/PDF encoders and output sinks |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod color;
pub mod crop;
pub mod design;
pub mod error;
pub mod export;
pub mod layout;
pub mod preview;
pub mod render;
pub mod server;

// Re-exports for convenience
pub use crop::{CropSpec, CroppedImage, SourceImage};
pub use design::{DesignConfig, PatternKind, TextPosition};
pub use error::{CollageError, CollageResult};
pub use render::collage::{FinishedRaster, render};
pub use render::text::FontBook;
