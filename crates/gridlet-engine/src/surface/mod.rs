//! Drawing surfaces.
//!
//! The renderer depends on nothing beyond [`Surface`]. [`PixelSurface`] is
//! the CPU implementation used by the studio and by tests; [`ansi`] turns
//! one into a terminal preview.

pub mod ansi;
mod pixel;

pub use pixel::PixelSurface;

use crate::coords::Rect;
use crate::paint::Color;

/// A resizable 2D target that can fill rectangles.
pub trait Surface {
    /// Sets the pixel dimensions. Resizing clears every pixel to transparent,
    /// even when the size does not change.
    fn set_dimensions(&mut self, width: u32, height: u32);

    /// Fills `rect` with `color`. Parts outside the surface are clipped.
    fn fill_rect(&mut self, rect: Rect, color: Color);
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn set_dimensions(&mut self, width: u32, height: u32) {
        (**self).set_dimensions(width, height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        (**self).fill_rect(rect, color);
    }
}
