//! Gridlet engine crate.
//!
//! Owns everything between a color-function source string and a painted
//! grid: palette, drawing surfaces, the grid renderer, the animation
//! scheduler and the single-threaded session loop that ties them to an
//! editor.

pub mod coords;
pub mod core;
pub mod logging;
pub mod paint;
pub mod presets;
pub mod render;
pub mod surface;
pub mod time;
