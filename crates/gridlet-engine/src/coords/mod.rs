//! Pixel geometry shared by surfaces and the renderer.
//!
//! Canonical space:
//! - whole device pixels
//! - origin top-left
//! - +X right, +Y down

mod rect;

pub use rect::Rect;
