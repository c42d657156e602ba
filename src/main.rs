//! # Collagist CLI
//!
//! Command-line interface for composing photobooth collages.
//!
//! ## Usage
//!
//! ```bash
//! # List available background patterns
//! collagist patterns
//!
//! # Compose two photos (centered square crops) into photobooth-collage.png
//! collagist render --image left.jpg --image right.jpg
//!
//! # Explicit crops, a saved design and both export formats
//! collagist render --image a.jpg --image b.jpg --image c.jpg \
//!     --crop 0,0,800,800 --crop 120,40,600,600 --crop 0,0,1000,1000 \
//!     --design design.json --format png --format pdf --out-dir out/
//!
//! # Start the HTTP API
//! collagist serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use collagist::{
    CollageError, CollageResult, CropSpec, DesignConfig, FontBook, PatternKind, SourceImage,
    crop::crop_all,
    export::{DirectorySink, ExportFormat, ExportSink, export_blocking},
    render::collage::{self, EXPORT_SCALE},
    server::{self, ServerConfig},
};

/// Collagist - Photobooth collage compositor
#[derive(Parser, Debug)]
#[command(name = "collagist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose photos into a collage file
    Render {
        /// Source photo, in top-to-bottom order (2 or 3)
        #[arg(long = "image", value_name = "FILE", required = true)]
        images: Vec<PathBuf>,

        /// Crop rectangle `x,y,width,height` per image (default: centered square)
        #[arg(long = "crop", value_name = "X,Y,W,H", value_parser = parse_crop)]
        crops: Vec<CropSpec>,

        /// Design configuration as JSON (defaults when omitted)
        #[arg(long, value_name = "FILE")]
        design: Option<PathBuf>,

        /// Override the background pattern
        #[arg(long, value_parser = parse_pattern)]
        pattern: Option<PatternKind>,

        /// Override the caption text
        #[arg(long)]
        text: Option<String>,

        /// Output format, repeatable
        #[arg(long = "format", value_name = "FORMAT", value_parser = parse_format)]
        formats: Vec<ExportFormat>,

        /// Output directory
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Render scale (logical pixel multiplier)
        #[arg(long, default_value_t = EXPORT_SCALE)]
        scale: f32,

        /// Directory of .ttf/.otf caption fonts, repeatable
        #[arg(long = "font-dir", value_name = "DIR")]
        font_dirs: Vec<PathBuf>,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// Directory of .ttf/.otf caption fonts, repeatable
        #[arg(long = "font-dir", value_name = "DIR")]
        font_dirs: Vec<PathBuf>,
    },

    /// List available background patterns
    Patterns,
}

fn parse_crop(s: &str) -> Result<CropSpec, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<_, _>>()?;
    match values[..] {
        [x, y, width, height] => Ok(CropSpec::new(x, y, width, height)),
        _ => Err(format!("expected x,y,width,height, got '{}'", s)),
    }
}

fn parse_pattern(s: &str) -> Result<PatternKind, String> {
    PatternKind::by_name(s).ok_or_else(|| {
        let names: Vec<&str> = PatternKind::ALL.iter().map(|p| p.name()).collect();
        format!("unknown pattern '{}' (expected one of: {})", s, names.join(", "))
    })
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    ExportFormat::by_name(s).ok_or_else(|| format!("unknown format '{}' (expected png or pdf)", s))
}

fn font_dirs_or_default(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    if dirs.is_empty() {
        ServerConfig::default().font_dirs
    } else {
        dirs
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> CollageResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Patterns => {
            println!("Available patterns:");
            for pattern in PatternKind::ALL {
                println!("  {}", pattern.name());
            }
        }
        Commands::Serve { listen, font_dirs } => {
            let config = ServerConfig {
                listen_addr: listen,
                font_dirs: font_dirs_or_default(font_dirs),
            };
            server::serve(config).await?;
        }
        Commands::Render {
            images,
            crops,
            design,
            pattern,
            text,
            formats,
            out_dir,
            scale,
            font_dirs,
        } => {
            if !crops.is_empty() && crops.len() != images.len() {
                return Err(CollageError::validation(format!(
                    "got {} --crop values for {} images",
                    crops.len(),
                    images.len()
                )));
            }

            let mut config = match design {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)?;
                    serde_json::from_str::<DesignConfig>(&json).map_err(|e| {
                        CollageError::validation(format!("design file {}: {}", path.display(), e))
                    })?
                }
                None => DesignConfig::default(),
            };
            if let Some(pattern) = pattern {
                config.pattern = pattern;
            }
            if let Some(text) = text {
                config.text.content = text;
            }

            let mut jobs = Vec::with_capacity(images.len());
            for (index, path) in images.iter().enumerate() {
                let bytes = std::fs::read(path)?;
                let source = SourceImage::decode(path.display().to_string(), &bytes)?;
                let spec = crops.get(index).copied().unwrap_or_else(|| {
                    CropSpec::from_zoom(source.width(), source.height(), 1.0, (0.5, 0.5))
                });
                jobs.push((source, spec));
            }
            let cropped = crop_all(&jobs).into_iter().collect::<CollageResult<Vec<_>>>()?;

            let fonts = FontBook::from_dirs(&font_dirs_or_default(font_dirs));
            let raster = collage::render(&cropped, &config, scale, &fonts).await?;

            let formats = if formats.is_empty() {
                vec![ExportFormat::Png]
            } else {
                formats
            };
            let sink = DirectorySink::new(out_dir);
            for format in formats {
                let artifact = export_blocking(raster.clone(), format).await?;
                let location = sink.deliver(&artifact).await?;
                println!("Saved to {}", location);
            }
        }
    }

    Ok(())
}
