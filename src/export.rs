//! # Export
//!
//! Encoders that turn a [`FinishedRaster`] into a downloadable file, and
//! sinks that deliver the result.
//!
//! - PNG: lossless, straight RGBA.
//! - PDF: one page exactly the size of the raster (1 unit per pixel), with
//!   the raster embedded as a quality-95 JPEG and drawn full-page. The page
//!   is landscape when the raster is wider than tall.
//!
//! Encoding either succeeds completely or returns an error; a sink only ever
//! sees finished artifacts.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CollageError, CollageResult};
use crate::render::collage::FinishedRaster;

/// JPEG quality of the image embedded in PDF exports.
pub const PDF_JPEG_QUALITY: u8 = 95;

/// Base name of exported files.
pub const EXPORT_BASENAME: &str = "photobooth-collage";

/// Downloadable file formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn default_filename(self) -> String {
        format!("{}.{}", EXPORT_BASENAME, self.extension())
    }

    /// Look up a format by extension (case insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        [ExportFormat::Png, ExportFormat::Pdf]
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(name))
    }
}

/// A fully encoded export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Page orientation of a PDF export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

impl PageOrientation {
    /// Landscape only when strictly wider than tall.
    pub fn for_size(width: u32, height: u32) -> Self {
        if width > height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }

    /// Page `(width, height)` for a `long × short` sheet in this orientation.
    pub fn page_size(self, width: u32, height: u32) -> (u32, u32) {
        let (long, short) = (width.max(height), width.min(height));
        match self {
            PageOrientation::Landscape => (long, short),
            PageOrientation::Portrait => (short, long),
        }
    }
}

/// Encode as PNG.
pub fn encode_png(raster: FinishedRaster) -> CollageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(raster.into_image())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| CollageError::encode(format!("PNG: {}", e)))?;
    Ok(bytes)
}

/// Encode as a baseline JPEG (alpha dropped).
pub fn encode_jpeg(raster: &FinishedRaster, quality: u8) -> CollageResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(raster.image().clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&rgb)
        .map_err(|e| CollageError::encode(format!("JPEG: {}", e)))?;
    Ok(bytes)
}

/// Encode as a single-page PDF.
pub fn encode_pdf(raster: FinishedRaster) -> CollageResult<Vec<u8>> {
    let (width, height) = (raster.width(), raster.height());
    let jpeg = encode_jpeg(&raster, PDF_JPEG_QUALITY)?;
    let (page_w, page_h) = PageOrientation::for_size(width, height).page_size(width, height);

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", page_w, page_h);

    let mut objects: Vec<Vec<u8>> = Vec::new();
    objects.push(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec());
    objects.push(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_vec());
    objects.push(
        format!(
            "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>\nendobj\n",
            page_w, page_h
        )
        .into_bytes(),
    );

    let mut image_obj = format!(
        "4 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} \
         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        width,
        height,
        jpeg.len()
    )
    .into_bytes();
    image_obj.extend_from_slice(&jpeg);
    image_obj.extend_from_slice(b"\nendstream\nendobj\n");
    objects.push(image_obj);

    objects.push(
        format!(
            "5 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
            content.len(),
            content
        )
        .into_bytes(),
    );

    let mut pdf = Vec::with_capacity(jpeg.len() + 1024);
    pdf.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for obj in &objects {
        offsets.push(pdf.len());
        pdf.extend_from_slice(obj);
    }

    let xref_offset = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    Ok(pdf)
}

/// Encode `raster` in `format`.
pub fn export(raster: FinishedRaster, format: ExportFormat) -> CollageResult<ExportArtifact> {
    let (width, height) = (raster.width(), raster.height());
    let bytes = match format {
        ExportFormat::Png => encode_png(raster)?,
        ExportFormat::Pdf => encode_pdf(raster)?,
    };
    info!(
        format = format.extension(),
        width,
        height,
        bytes = bytes.len(),
        "collage exported"
    );
    Ok(ExportArtifact {
        filename: format.default_filename(),
        mime: format.mime(),
        bytes,
    })
}

/// [`export`] on the blocking thread pool.
pub async fn export_blocking(raster: FinishedRaster, format: ExportFormat) -> CollageResult<ExportArtifact> {
    tokio::task::spawn_blocking(move || export(raster, format))
        .await
        .map_err(|e| CollageError::encode(format!("export task failed: {}", e)))?
}

/// Destination for finished exports.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Store `artifact`, returning where it went.
    async fn deliver(&self, artifact: &ExportArtifact) -> CollageResult<String>;
}

/// Writes artifacts into a directory, under their own filenames.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn deliver(&self, artifact: &ExportArtifact) -> CollageResult<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&artifact.filename);
        let partial = self.dir.join(format!(".{}.partial", artifact.filename));

        // Rename into place so readers never see a half-written file
        if let Err(e) = tokio::fs::write(&partial, &artifact.bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        tokio::fs::rename(&partial, &path).await?;

        let location = path.display().to_string();
        info!(path = %location, bytes = artifact.bytes.len(), "export written");
        Ok(location)
    }
}
