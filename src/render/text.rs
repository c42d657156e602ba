//! TrueType text for the caption overlay.
//!
//! Fonts are loaded into a [`FontBook`] from `.ttf`/`.otf` files and looked up
//! by a CSS `font-family` list such as `"'Dancing Script', cursive"`. Text is
//! laid out on a single line, centered on an anchor, and rasterized with
//! ab_glyph into an anti-aliased coverage mask that is composited onto the
//! [`Surface`].

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use std::path::{Path, PathBuf};
use tiny_skia::Color;
use tracing::{debug, warn};

use super::surface::Surface;
use crate::error::{CollageError, CollageResult};

/// Weight the caption is drawn at (CSS `font-weight: 600`).
pub const CAPTION_WEIGHT: u16 = 600;

/// Families tried, in order, when a generic family asks for the default.
const PREFERRED_DEFAULTS: [&str; 6] = [
    "inter",
    "dejavusans",
    "liberationsans",
    "notosans",
    "roboto",
    "arial",
];

const GENERIC_FAMILIES: [&str; 9] = [
    "serif",
    "sansserif",
    "monospace",
    "cursive",
    "fantasy",
    "systemui",
    "uiserif",
    "uisansserif",
    "uimonospace",
];

/// One loaded face.
#[derive(Clone)]
struct FontEntry {
    family: String,
    weight: u16,
    italic: bool,
    font: FontArc,
}

/// The set of fonts available to the text overlay.
#[derive(Clone, Default)]
pub struct FontBook {
    entries: Vec<FontEntry>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.entries.len())
            .field("families", &self.families())
            .finish()
    }
}

/// Lowercase ASCII alphanumerics only: `"Dancing Script"` -> `"dancingscript"`.
fn normalize_family(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Split a file stem like `Inter-SemiBoldItalic` into family, weight and
/// slant.
fn parse_face_name(stem: &str) -> (String, u16, bool) {
    let (family, style) = match stem.split_once('-') {
        Some((family, style)) => (family, style.to_ascii_lowercase()),
        None => (stem, String::new()),
    };
    let italic = style.contains("italic") || style.contains("oblique");
    let style = style.replace("italic", "").replace("oblique", "");
    let weight = match style.as_str() {
        "thin" | "hairline" => 100,
        "extralight" | "ultralight" => 200,
        "light" => 300,
        "medium" => 500,
        "semibold" | "demibold" => 600,
        "bold" => 700,
        "extrabold" | "ultrabold" => 800,
        "black" | "heavy" => 900,
        _ => 400,
    };
    (normalize_family(family), weight, italic)
}

/// Distance from the requested weight using CSS matching order for
/// weights above 500: heavier faces first, then lighter ones.
fn weight_rank(weight: u16, italic: bool) -> u32 {
    let distance = if weight >= CAPTION_WEIGHT {
        (weight - CAPTION_WEIGHT) as u32
    } else {
        1000 + (CAPTION_WEIGHT - weight) as u32
    };
    if italic { distance + 10_000 } else { distance }
}

fn is_generic(family: &str) -> bool {
    GENERIC_FAMILIES.contains(&family)
}

/// Parse a CSS `font-family` list into normalized family names.
pub fn parse_family_list(css: &str) -> Vec<String> {
    css.split(',')
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\''))
        .map(normalize_family)
        .filter(|name| !name.is_empty())
        .collect()
}

fn collect_font_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping font directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, out);
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
        {
            out.push(path);
        }
    }
}

impl FontBook {
    /// A book with no fonts. Captions cannot be drawn with it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `.ttf` and `.otf` file found under `dirs`, recursively.
    ///
    /// Missing directories and unreadable fonts are skipped with a warning.
    /// Files are loaded in path order so lookups are reproducible.
    pub fn from_dirs(dirs: &[PathBuf]) -> Self {
        let mut files = Vec::new();
        for dir in dirs {
            collect_font_files(dir, &mut files);
        }
        files.sort();

        let mut book = Self::empty();
        for path in files {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let loaded = std::fs::read(&path)
                .map_err(CollageError::from)
                .and_then(|bytes| book.add_font(&stem, bytes));
            if let Err(e) = loaded {
                warn!(path = %path.display(), error = %e, "failed to load font");
            }
        }
        debug!(faces = book.len(), "font book loaded");
        book
    }

    /// Register a face under a file-stem style name such as `Inter-SemiBold`.
    pub fn add_font(&mut self, name: &str, bytes: Vec<u8>) -> CollageResult<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| CollageError::decode(format!("font '{}': {}", name, e)))?;
        let (family, weight, italic) = parse_face_name(name);
        self.entries.push(FontEntry {
            family,
            weight,
            italic,
            font,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized family names, deduplicated, in load order.
    pub fn families(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.family.as_str()) {
                seen.push(&entry.family);
            }
        }
        seen
    }

    fn best_in_family(&self, family: &str) -> Option<&FontArc> {
        self.entries
            .iter()
            .filter(|e| e.family == family)
            .min_by_key(|e| weight_rank(e.weight, e.italic))
            .map(|e| &e.font)
    }

    /// The face used for generic families and unknown names.
    pub fn default_font(&self) -> Option<&FontArc> {
        PREFERRED_DEFAULTS
            .iter()
            .find_map(|family| self.best_in_family(family))
            .or_else(|| {
                let first = self.entries.first()?;
                self.best_in_family(&first.family)
            })
    }

    /// Resolve a CSS `font-family` list.
    ///
    /// The first installed family wins; a generic family resolves to the
    /// default face, as does a list where nothing is installed. `None` only
    /// when the book is empty.
    pub fn resolve(&self, css_family: &str) -> Option<&FontArc> {
        for family in parse_family_list(css_family) {
            if is_generic(&family) {
                return self.default_font();
            }
            if let Some(font) = self.best_in_family(&family) {
                return Some(font);
            }
        }
        self.default_font()
    }
}

/// ab_glyph scales by line height; CSS sizes are em sizes.
fn px_scale(font: &FontArc, size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * font.height_unscaled() / units_per_em)
}

fn layout(font: &FontArc, text: &str, scale: PxScale) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::new();
    let mut caret = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push((id, caret));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }
    (glyphs, caret)
}

/// Advance width of `text` at em size `size`.
pub fn measure(font: &FontArc, text: &str, size: f32) -> f32 {
    layout(font, text, px_scale(font, size)).1
}

/// Draw one line of text horizontally centered on `center_x` with its
/// baseline at `baseline`. Anything past the surface edges is clipped.
pub fn draw_text(
    surface: &mut Surface,
    font: &FontArc,
    text: &str,
    size: f32,
    center_x: f32,
    baseline: f32,
    color: Color,
) {
    if text.is_empty() || !size.is_finite() || size <= 0.0 {
        return;
    }
    let scale = px_scale(font, size);
    let (glyphs, width) = layout(font, text, scale);
    let start_x = center_x - width / 2.0;

    let outlined: Vec<_> = glyphs
        .into_iter()
        .filter_map(|(id, x)| {
            font.outline_glyph(id.with_scale_and_position(scale, point(start_x + x, baseline)))
        })
        .collect();
    if outlined.is_empty() {
        return;
    }

    // Union of glyph bounds, clipped to the surface
    let (mut x0, mut y0, mut x1, mut y1) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    for glyph in &outlined {
        let b = glyph.px_bounds();
        x0 = x0.min(b.min.x as i32);
        y0 = y0.min(b.min.y as i32);
        x1 = x1.max(b.max.x.ceil() as i32);
        y1 = y1.max(b.max.y.ceil() as i32);
    }
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(surface.width() as i32);
    let y1 = y1.min(surface.height() as i32);
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    let mask_width = (x1 - x0) as usize;
    let mask_height = (y1 - y0) as usize;

    let mut coverage = vec![0.0f32; mask_width * mask_height];
    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        glyph.draw(|px, py, c| {
            let x = px as i32 + bounds.min.x as i32 - x0;
            let y = py as i32 + bounds.min.y as i32 - y0;
            if x >= 0 && (x as usize) < mask_width && y >= 0 && (y as usize) < mask_height {
                let idx = y as usize * mask_width + x as usize;
                coverage[idx] = (coverage[idx] + c).min(1.0);
            }
        });
    }

    let mask: Vec<u8> = coverage.iter().map(|c| (c * 255.0).round() as u8).collect();
    surface.fill_mask(x0, y0, mask_width as u32, mask_height as u32, &mask, color);
}
