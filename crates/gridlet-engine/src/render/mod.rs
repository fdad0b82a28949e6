//! Grid rendering.
//!
//! Turns one source text (and, when animating, one time value) into one
//! painted frame on a [`Surface`](crate::surface::Surface).

mod grid;

pub use grid::{FrameStats, GridConfig, GridRenderer, RenderError};
