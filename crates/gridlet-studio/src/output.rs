use std::io::Write as _;
use std::path::PathBuf;

use gridlet_engine::render::FrameStats;
use gridlet_engine::surface::{ansi, PixelSurface};

/// Where finished frames go.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    png: Option<PathBuf>,
    preview: bool,
    /// Redraw the preview in place instead of appending.
    redraw: bool,
    cell_px: u32,
}

impl FrameOutput {
    pub fn new(png: Option<PathBuf>, preview: bool, cell_px: u32) -> Self {
        Self { png, preview, redraw: true, cell_px }
    }

    pub fn redraw(mut self, on: bool) -> Self {
        self.redraw = on;
        self
    }

    pub fn write(&self, surface: &PixelSurface, stats: &FrameStats) {
        log::debug!(
            "frame t={:?}: {} cells, {} call errors, {} fallback",
            stats.time,
            stats.cells,
            stats.call_errors,
            stats.fallback_cells,
        );

        if let Some(path) = &self.png {
            if let Err(e) = surface.save_png(path) {
                log::error!("{e:#}");
            }
        }

        if self.preview {
            let mut frame = String::new();
            if self.redraw {
                frame.push_str("\x1b[H\x1b[2J");
            }
            frame.push_str(&ansi::render_preview(surface, self.cell_px));
            frame.push_str(&status_line(stats));
            frame.push('\n');

            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(frame.as_bytes()).and_then(|()| stdout.flush()) {
                log::warn!("preview: {e}");
            }
        }
    }
}

fn status_line(stats: &FrameStats) -> String {
    let mut line = match stats.time {
        Some(t) => format!("time {t}"),
        None => "still".to_string(),
    };
    if stats.call_errors > 0 {
        line.push_str(&format!(" | {} cells failed", stats.call_errors));
    }
    if stats.fallback_cells > 0 {
        line.push_str(&format!(" | {} out of range", stats.fallback_cells));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_problems() {
        let stats = FrameStats { cells: 400, call_errors: 2, fallback_cells: 0, time: Some(4) };
        assert_eq!(status_line(&stats), "time 4 | 2 cells failed");
        assert_eq!(status_line(&FrameStats::default()), "still");
    }

    #[test]
    fn writes_png_per_frame() {
        let dir = std::env::temp_dir().join(format!("gridlet-output-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");
        let _ = std::fs::remove_file(&path);

        let out = FrameOutput::new(Some(path.clone()), false, 20);
        out.write(&PixelSurface::new(2, 2), &FrameStats::default());
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}
