//! Procedural background textures.
//!
//! Five patterns, all painted directly onto a [`Surface`] from the top-left
//! corner `(0, 0)`:
//!
//! | Pattern | Drawing | Ink |
//! |---------|---------|-----|
//! | `none` | nothing | - |
//! | `dots` | circle of radius `1.5 × scale` at every grid point | soft |
//! | `lines` | 45° diagonals, `1 × scale` wide | soft |
//! | `grid` | vertical and horizontal lines, `0.5 × scale` wide | soft |
//! | `checkers` | two `spacing²` squares per `2 × spacing` cell | strong |
//!
//! Spacing is `max(spacing_logical × scale, 5 × scale)`. The floor keeps tiny
//! spacing values from exploding the number of primitives.
//!
//! Painting is a pure function of its arguments: the same inputs always give
//! byte-identical pixels.

use tiny_skia::Color;

use super::surface::Surface;
use crate::design::PatternKind;

/// Minimum spacing in logical pixels.
pub const MIN_SPACING: f32 = 5.0;

/// Dot radius in logical pixels.
pub const DOT_RADIUS: f32 = 1.5;

/// Stroke width of diagonal lines in logical pixels.
pub const LINE_WIDTH: f32 = 1.0;

/// Stroke width of grid lines in logical pixels.
pub const GRID_LINE_WIDTH: f32 = 0.5;

/// Effective spacing in output pixels.
pub fn spacing(spacing_logical: f32, scale: f32) -> f32 {
    (spacing_logical * scale).max(MIN_SPACING * scale)
}

/// Positions `0, step, 2·step, …` strictly below `end`.
fn steps(start: f32, end: f32, step: f32) -> impl Iterator<Item = f32> {
    (0u32..)
        .map(move |i| start + i as f32 * step)
        .take_while(move |&v| v < end)
}

/// Paint `pattern` over the `width × height` region of `surface`.
#[allow(clippy::too_many_arguments)]
pub fn paint(
    surface: &mut Surface,
    width: f32,
    height: f32,
    pattern: PatternKind,
    spacing_logical: f32,
    scale: f32,
    ink_soft: Color,
    ink_strong: Color,
) {
    let spacing = spacing(spacing_logical, scale);
    // A non-positive scale would never advance the loops
    if !spacing.is_finite() || spacing <= 0.0 {
        return;
    }

    match pattern {
        PatternKind::None => {}
        PatternKind::Dots => paint_dots(surface, width, height, spacing, scale, ink_soft),
        PatternKind::Lines => paint_lines(surface, width, height, spacing, scale, ink_soft),
        PatternKind::Grid => paint_grid(surface, width, height, spacing, scale, ink_soft),
        PatternKind::Checkers => paint_checkers(surface, width, height, spacing, ink_strong),
    }
}

fn paint_dots(surface: &mut Surface, width: f32, height: f32, spacing: f32, scale: f32, ink: Color) {
    let centers: Vec<(f32, f32)> = steps(0.0, width, spacing)
        .flat_map(|x| steps(0.0, height, spacing).map(move |y| (x, y)))
        .collect();
    surface.fill_circles(&centers, DOT_RADIUS * scale, ink);
}

fn paint_lines(surface: &mut Surface, width: f32, height: f32, spacing: f32, scale: f32, ink: Color) {
    for i in steps(-width, width + height, spacing) {
        surface.stroke_line((i, 0.0), (i + height, height), LINE_WIDTH * scale, ink);
    }
}

fn paint_grid(surface: &mut Surface, width: f32, height: f32, spacing: f32, scale: f32, ink: Color) {
    let line_width = GRID_LINE_WIDTH * scale;
    for x in steps(0.0, width, spacing) {
        surface.stroke_line((x, 0.0), (x, height), line_width, ink);
    }
    for y in steps(0.0, height, spacing) {
        surface.stroke_line((0.0, y), (width, y), line_width, ink);
    }
}

fn paint_checkers(surface: &mut Surface, width: f32, height: f32, spacing: f32, ink: Color) {
    let cell = spacing * 2.0;
    for x in steps(0.0, width, cell) {
        for y in steps(0.0, height, cell) {
            surface.fill_rect(x, y, spacing, spacing, ink);
            surface.fill_rect(x + spacing, y + spacing, spacing, spacing, ink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::pattern_ink;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn painted(pattern: PatternKind, spacing_logical: f32, scale: f32, size: (u32, u32)) -> Surface {
        let ink = pattern_ink("#ffffff");
        let mut surface = Surface::new(size.0, size.1).unwrap();
        surface.fill(Color::WHITE);
        paint(
            &mut surface,
            size.0 as f32,
            size.1 as f32,
            pattern,
            spacing_logical,
            scale,
            ink.soft.to_skia(),
            ink.strong.to_skia(),
        );
        surface
    }

    fn non_background(surface: &Surface) -> usize {
        (0..surface.height())
            .flat_map(|y| (0..surface.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| surface.pixel(x, y) != Some(WHITE))
            .count()
    }

    #[test]
    fn test_spacing_floor() {
        assert_eq!(spacing(10.0, 4.0), 40.0);
        assert_eq!(spacing(1.0, 4.0), 20.0);
        assert_eq!(spacing(100.0, 1.0), 100.0);
    }

    #[test]
    fn test_steps() {
        let v: Vec<f32> = steps(0.0, 100.0, 40.0).collect();
        assert_eq!(v, vec![0.0, 40.0, 80.0]);
        let v: Vec<f32> = steps(-10.0, 10.0, 5.0).collect();
        assert_eq!(v, vec![-10.0, -5.0, 0.0, 5.0]);
    }

    #[test]
    fn test_none_paints_nothing() {
        let surface = painted(PatternKind::None, 20.0, 1.0, (64, 64));
        assert_eq!(non_background(&surface), 0);
    }

    #[test]
    fn test_every_pattern_is_deterministic() {
        for pattern in PatternKind::ALL {
            let a = painted(pattern, 12.0, 2.0, (120, 90));
            let b = painted(pattern, 12.0, 2.0, (120, 90));
            assert_eq!(a.data(), b.data(), "{} is not deterministic", pattern.name());
        }
    }

    #[test]
    fn test_visible_patterns_leave_ink() {
        for pattern in PatternKind::ALL.into_iter().filter(|p| *p != PatternKind::None) {
            let surface = painted(pattern, 10.0, 1.0, (64, 64));
            assert!(non_background(&surface) > 0, "{} drew nothing", pattern.name());
        }
    }

    #[test]
    fn test_dots_on_grid() {
        // patternScale 10 at scale 4: spacing 40, radius 6
        let surface = painted(PatternKind::Dots, 10.0, 4.0, (120, 120));
        for (x, y) in [(40, 40), (80, 40), (40, 80), (80, 80)] {
            let p = surface.pixel(x, y).unwrap();
            assert!(p[0] < 230, "expected a dot at ({}, {}), got {:?}", x, y, p);
        }
        // Between dots
        assert_eq!(surface.pixel(20, 20), Some(WHITE));
        assert_eq!(surface.pixel(60, 40), Some(WHITE));
        // Just outside the radius
        assert_eq!(surface.pixel(47, 40), Some(WHITE));
    }

    #[test]
    fn test_dot_ink_is_soft() {
        let surface = painted(PatternKind::Dots, 10.0, 4.0, (120, 120));
        let p = surface.pixel(40, 40).unwrap();
        // 15% black over white
        assert!((p[0] as i32 - 217).abs() <= 2, "got {:?}", p);
    }

    #[test]
    fn test_checkers_layout() {
        let surface = painted(PatternKind::Checkers, 10.0, 1.0, (40, 40));
        let inked = |x, y| surface.pixel(x, y).unwrap()[0] < 255;
        assert!(inked(5, 5));
        assert!(inked(15, 15));
        assert!(!inked(15, 5));
        assert!(!inked(5, 15));
        assert!(inked(25, 25));
        // 30% black over white
        let p = surface.pixel(5, 5).unwrap();
        assert!((p[0] as i32 - 178).abs() <= 2, "got {:?}", p);
    }

    #[test]
    fn test_grid_lines_on_multiples() {
        let surface = painted(PatternKind::Grid, 20.0, 2.0, (100, 100));
        // Line at x = 40 (half-pixel stroke straddles the boundary)
        let on_line = surface.pixel(39, 10).unwrap()[0] < 255 || surface.pixel(40, 10).unwrap()[0] < 255;
        assert!(on_line);
        assert_eq!(surface.pixel(20, 10), Some(WHITE));
    }

    #[test]
    fn test_lines_are_diagonal() {
        let surface = painted(PatternKind::Lines, 20.0, 1.0, (100, 100));
        // The line through the origin passes (50, 50)
        assert!(surface.pixel(50, 50).unwrap()[0] < 255);
        // Halfway between two diagonals
        assert_eq!(surface.pixel(60, 50), Some(WHITE));
    }
}
