//! Paint model for the grid.
//!
//! Scope:
//! - color representation (straight-alpha sRGB bytes)
//! - the fixed cell palette and its index resolution
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod palette;

pub use color::{Color, ColorParseError};
pub use palette::Palette;
