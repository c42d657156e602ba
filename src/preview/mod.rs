//! # Live Preview
//!
//! Renders a collage as a self-contained HTML fragment for the editor.
//!
//! The fragment is sized by the same [`plan`] call the rasterizer uses, at
//! scale 1, so the preview has exactly the proportions of the exported file.
//! The pattern is expressed as CSS background gradients tiled at the pattern
//! spacing; the caption is live HTML text.
//!
//! ```text
//! div.collage-preview      width 400px, padding = border, background + pattern
//! ├── div.collage-images   flex column, gap = border
//! │   └── div × N          cell × cell, <img> with object-fit: cover
//! └── div.collage-caption  text band, order -1 (top) or 1 (bottom)
//! ```
//!
//! ## Example
//!
//! ```
//! use collagist::design::DesignConfig;
//! use collagist::preview::{PreviewImage, render_html};
//!
//! let images = vec![
//!     PreviewImage::new("a", "/api/images/a/cropped"),
//!     PreviewImage::new("b", "/api/images/b/cropped"),
//! ];
//! let html = render_html(&images, &DesignConfig::default()).unwrap();
//! assert!(html.contains("width:400px"));
//! ```


use crate::color::{PatternInk, pattern_ink};
use crate::design::{DesignConfig, PatternKind, TextPosition};
use crate::error::CollageResult;
use crate::layout::plan;
use crate::render::collage::check_image_count;
use crate::render::patterns;

/// An image as the browser sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub id: String,
    pub url: String,
}

impl PreviewImage {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Escape text for HTML content and double-quoted attributes.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// CSS length with at most three decimals and no trailing zeros.
fn px(value: f32) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{}px", s)
}

/// `background-*` declarations for a pattern.
fn pattern_css(pattern: PatternKind, pattern_scale: f32, ink: &PatternInk) -> String {
    let s = patterns::spacing(pattern_scale, 1.0);
    let soft = ink.soft.to_css();
    let strong = ink.strong.to_css();
    let dot = px(patterns::DOT_RADIUS);
    let hair = px(patterns::GRID_LINE_WIDTH);

    match pattern {
        PatternKind::None => String::new(),
        // Each dot sits at a tile corner; shift the tiles by half a cell
        PatternKind::Dots => format!(
            "background-image:radial-gradient(circle,{soft} {dot},transparent {dot});\
             background-size:{s} {s};background-position:{o} {o};",
            s = px(s),
            o = px(-s / 2.0),
        ),
        PatternKind::Lines => format!(
            "background-image:repeating-linear-gradient(45deg,{soft} 0 {w},transparent {w} {p});",
            w = px(patterns::LINE_WIDTH),
            p = px(s / std::f32::consts::SQRT_2),
        ),
        PatternKind::Grid => format!(
            "background-image:linear-gradient(to right,{soft} {hair},transparent {hair}),\
             linear-gradient(to bottom,{soft} {hair},transparent {hair});\
             background-size:{s} {s};",
            s = px(s),
        ),
        PatternKind::Checkers => format!(
            "background-image:conic-gradient(transparent 0 25%,{strong} 0 50%,transparent 0 75%,{strong} 0);\
             background-size:{c} {c};",
            c = px(s * 2.0),
        ),
    }
}

/// Render the live preview of `images` with `config`.
///
/// Fails with a validation error for the same inputs the rasterizer rejects
/// before drawing.
pub fn render_html(images: &[PreviewImage], config: &DesignConfig) -> CollageResult<String> {
    check_image_count(images.len())?;
    config.validate()?;
    let plan = plan(images.len(), config, 1.0)?;
    let ink = pattern_ink(&config.background_color);
    let text = &config.text;

    let mut html = String::new();
    html.push_str(&format!(
        "<div class=\"collage-preview\" style=\"box-sizing:border-box;display:flex;flex-direction:column;\
         width:{width};height:{height};padding:{border};background-color:{bg};{pattern}\">",
        width = px(plan.total_width),
        height = px(plan.total_height),
        border = px(plan.border),
        bg = escape_html(&config.background_color),
        pattern = pattern_css(config.pattern, config.pattern_scale, &ink),
    ));

    html.push_str(&format!(
        "<div class=\"collage-images\" style=\"display:flex;flex-direction:column;gap:{};\">",
        px(plan.gap)
    ));
    for (index, image) in images.iter().enumerate() {
        html.push_str(&format!(
            "<div class=\"collage-image\" data-id=\"{id}\" style=\"width:{cell};height:{cell};\">\
             <img src=\"{url}\" alt=\"Photo {n}\" style=\"display:block;width:100%;height:100%;object-fit:cover;\">\
             </div>",
            id = escape_html(&image.id),
            cell = px(plan.cell_width),
            url = escape_html(&image.url),
            n = index + 1,
        ));
    }
    html.push_str("</div>");

    let (order, align) = match text.position {
        TextPosition::Top => (-1, "flex-start"),
        TextPosition::Bottom => (1, "flex-end"),
    };
    let content = if text.has_content() {
        escape_html(&text.content)
    } else {
        "&nbsp;".to_string()
    };
    html.push_str(&format!(
        "<div class=\"collage-caption\" style=\"order:{order};display:flex;align-items:{align};\
         justify-content:center;height:{band};flex-shrink:0;overflow:hidden;white-space:nowrap;\
         font-size:{size};line-height:1.2;font-weight:600;font-family:{family};color:{color};\">{content}</div>",
        band = px(plan.text_band_height),
        size = px(plan.font_size),
        family = escape_html(&text.font_family),
        color = escape_html(&text.color),
    ));

    html.push_str("</div>");
    Ok(html)
}
