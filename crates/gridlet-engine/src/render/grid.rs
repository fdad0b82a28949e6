use std::fmt;

use gridlet_lang::{CallError, CellArgs, CompileError, Evaluator, Value};

use crate::coords::Rect;
use crate::paint::{Color, Palette};
use crate::surface::Surface;

/// Grid dimensions in cells and the on-surface size of one cell.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub cell_size_px: u32,
}

impl GridConfig {
    pub const STILL: GridConfig = GridConfig { width: 20, height: 20, cell_size_px: 20 };
    pub const ANIMATED: GridConfig = GridConfig { width: 40, height: 40, cell_size_px: 10 };

    #[inline]
    pub fn surface_width(self) -> u32 {
        self.width.saturating_mul(self.cell_size_px)
    }

    #[inline]
    pub fn surface_height(self) -> u32 {
        self.height.saturating_mul(self.cell_size_px)
    }

    #[inline]
    pub fn cell_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Painted area of cell `(x, y)`: one pixel short on the right and
    /// bottom, leaving a gap to the next cell.
    #[inline]
    pub fn cell_rect(self, x: u32, y: u32) -> Rect {
        let inner = self.cell_size_px.saturating_sub(1);
        Rect::new(
            x.saturating_mul(self.cell_size_px),
            y.saturating_mul(self.cell_size_px),
            inner,
            inner,
        )
    }
}

/// Outcome of a completed render.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub cells: u64,
    /// Cells whose call failed; painted with palette slot 0.
    pub call_errors: u64,
    /// Cells whose value named no palette slot; painted with the fallback.
    pub fallback_cells: u64,
    pub time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The source produced no color function; nothing was painted.
    Compile(CompileError),
    /// No surface to draw on; nothing was evaluated.
    MissingSurface,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Compile(e) => write!(f, "compile failed: {e}"),
            RenderError::MissingSurface => f.write_str("no drawing surface attached"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Compile(e) => Some(e),
            RenderError::MissingSurface => None,
        }
    }
}

impl From<CompileError> for RenderError {
    fn from(e: CompileError) -> Self {
        RenderError::Compile(e)
    }
}

/// Compiles a color function and paints it cell by cell.
#[derive(Debug, Clone)]
pub struct GridRenderer {
    grid: GridConfig,
    palette: Palette,
    background: Color,
    evaluator: Evaluator,
}

impl GridRenderer {
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            palette: Palette::default(),
            background: Palette::BACKGROUND,
            evaluator: Evaluator::new(),
        }
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn grid(&self) -> GridConfig {
        self.grid
    }

    /// Renders one frame.
    ///
    /// Order of effects:
    /// 1. no surface: return [`RenderError::MissingSurface`]
    /// 2. compile failure: return [`RenderError::Compile`], surface untouched
    /// 3. resize (clears), then background fill
    /// 4. every cell, row-major; a failing call paints slot 0, a value naming
    ///    no slot paints the fallback
    pub fn render<S>(
        &self,
        source: &str,
        time: Option<u64>,
        surface: Option<&mut S>,
    ) -> Result<FrameStats, RenderError>
    where
        S: Surface + ?Sized,
    {
        let Some(surface) = surface else {
            log::warn!("render skipped: no drawing surface attached");
            return Err(RenderError::MissingSurface);
        };

        let mut func = match self.evaluator.compile(source) {
            Ok(f) => f,
            Err(e) => {
                log::error!("render aborted, previous frame kept: {e}");
                return Err(e.into());
            }
        };

        let grid = self.grid;
        surface.set_dimensions(grid.surface_width(), grid.surface_height());
        surface.fill_rect(
            Rect::from_size(grid.surface_width(), grid.surface_height()),
            self.background,
        );

        let mut stats = FrameStats { time, ..FrameStats::default() };
        let mut first_error: Option<(u32, u32, CallError)> = None;

        for y in 0..grid.height {
            for x in 0..grid.width {
                let args = CellArgs { x: i64::from(x), y: i64::from(y), time };
                let value = match func.call(args) {
                    Ok(v) => v,
                    Err(e) => {
                        log::debug!("color({x}, {y}) failed: {e}");
                        stats.call_errors += 1;
                        if first_error.is_none() {
                            first_error = Some((x, y, e));
                        }
                        Value::Number(0.0)
                    }
                };
                if self.palette.index_of(&value).is_none() {
                    stats.fallback_cells += 1;
                }
                surface.fill_rect(grid.cell_rect(x, y), self.palette.resolve(&value));
                stats.cells += 1;
            }
        }

        if let Some((x, y, e)) = first_error {
            log::warn!(
                "{} of {} cells failed and used slot 0; first at ({x}, {y}): {e}",
                stats.call_errors,
                stats.cells,
            );
        }
        if stats.fallback_cells > 0 {
            log::debug!("{} cells returned no palette slot", stats.fallback_cells);
        }

        Ok(stats)
    }
}
