//! Terminal preview of a rendered grid.
//!
//! Each output character covers two grid rows using the upper half block
//! (`▀`): the foreground is the top cell, the background the bottom cell.
//! One pixel is sampled per cell, at its top-left corner.

use std::fmt::Write as _;

use super::PixelSurface;
use crate::paint::Color;

const UPPER_HALF: char = '\u{2580}';
const RESET: &str = "\x1b[0m";

/// Renders `surface` as 24-bit ANSI text, one character per cell column.
///
/// Transparent cells use the terminal's default colors. The result ends with
/// a newline after every text row.
pub fn render_preview(surface: &PixelSurface, cell_px: u32) -> String {
    let cell_px = cell_px.max(1);
    let cols = surface.width() / cell_px;
    let rows = surface.height() / cell_px;

    let sample = |cx: u32, cy: u32| -> Option<Color> {
        if cy >= rows {
            return None;
        }
        surface.pixel(cx * cell_px, cy * cell_px).filter(|c| c.a != 0)
    };

    let mut out = String::new();
    for row in (0..rows).step_by(2) {
        for col in 0..cols {
            match sample(col, row) {
                Some(c) => { let _ = write!(out, "\x1b[38;2;{};{};{}m", c.r, c.g, c.b); }
                None => out.push_str("\x1b[39m"),
            }
            match sample(col, row + 1) {
                Some(c) => { let _ = write!(out, "\x1b[48;2;{};{};{}m", c.r, c.g, c.b); }
                None => out.push_str("\x1b[49m"),
            }
            out.push(UPPER_HALF);
        }
        out.push_str(RESET);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::surface::Surface;

    #[test]
    fn empty_surface_renders_nothing() {
        assert_eq!(render_preview(&PixelSurface::default(), 10), "");
    }

    #[test]
    fn two_rows_share_one_line() {
        let mut s = PixelSurface::new(4, 4);
        s.fill_rect(Rect::new(0, 0, 2, 2), Color::rgb(255, 0, 0));
        s.fill_rect(Rect::new(0, 2, 2, 2), Color::rgb(0, 0, 255));
        let text = render_preview(&s, 2);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("\x1b[38;2;255;0;0m\x1b[48;2;0;0;255m\u{2580}"));
        // Right column was never painted.
        assert!(text.contains("\x1b[39m\x1b[49m\u{2580}"));
    }

    #[test]
    fn odd_row_count_leaves_default_background() {
        let mut s = PixelSurface::new(1, 3);
        s.fill_rect(s.bounds(), Color::rgb(1, 2, 3));
        let text = render_preview(&s, 1);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().contains("\x1b[49m"));
    }
}
