use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use gridlet_engine::core::{Session, SessionConfig, SessionEvent, Variant};
use gridlet_engine::logging::{init_logging, LoggingConfig};
use gridlet_engine::surface::PixelSurface;
use tokio::sync::mpsc;

mod commands;
mod editor;
mod output;
mod watch;

use editor::{prepare_source, FileEditor};
use output::FrameOutput;

#[derive(Parser, Debug)]
#[command(name = "gridlet-studio", version, about = "Edit a color function, watch the grid")]
struct Cli {
    /// Program file; created with a starter program if missing.
    #[arg(long, default_value = "color.js")]
    source: PathBuf,

    /// Single frames on commit, or a timer-driven animation.
    #[arg(long, value_enum, default_value_t = Mode::Still)]
    mode: Mode,

    /// Write every rendered frame to this PNG.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Draw frames in the terminal.
    #[arg(long, default_value_t = false)]
    preview: bool,

    /// Animation tick period in milliseconds.
    #[arg(long, default_value_t = 500)]
    tick_ms: u64,

    /// Source file poll period in milliseconds.
    #[arg(long, default_value_t = 250)]
    poll_ms: u64,

    /// Load this preset into the source file before starting.
    #[arg(long)]
    preset: Option<String>,

    /// Render one frame and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Log filter in env_logger syntax (default: RUST_LOG, else info).
    #[arg(long)]
    log: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Still,
    Animated,
}

impl From<Mode> for Variant {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Still => Variant::Still,
            Mode::Animated => Variant::Animated,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default();
    if let Some(filter) = &cli.log {
        logging = logging.filter(filter.clone());
    }
    init_logging(logging);

    let variant = Variant::from(cli.mode);
    prepare_source(&cli.source, variant, cli.preset.as_deref())?;

    let config = SessionConfig::new(variant).tick_interval(Duration::from_millis(cli.tick_ms));
    let output = FrameOutput::new(cli.out.clone(), cli.preview, variant.grid().cell_size_px)
        .redraw(!cli.once);
    let editor = FileEditor::new(&cli.source);
    let own_writes = editor.own_writes();
    let mut session = Session::new(config, editor)
        .surface(PixelSurface::default())
        .on_frame(move |surface, stats| output.write(surface, stats));

    if cli.once {
        let stats = session
            .render_now()
            .with_context(|| format!("render '{}'", cli.source.display()))?;
        if let Some(out) = &cli.out {
            eprintln!("wrote {}", out.display());
        }
        log::info!("{} cells, {} failed, {} out of range", stats.cells, stats.call_errors, stats.fallback_cells);
        return Ok(());
    }

    log::info!(
        "watching {} ({variant}); commands: render | preset <name> | presets | quit",
        session.editor().path().display()
    );

    let (events, rx) = mpsc::unbounded_channel();
    tokio::spawn(watch::watch_file(
        cli.source.clone(),
        Duration::from_millis(cli.poll_ms),
        own_writes,
        events.clone(),
    ));
    tokio::spawn(commands::read_commands(events.clone(), variant));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = events.send(SessionEvent::Shutdown);
        }
    });

    session.run(rx).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["gridlet-studio"]).unwrap();
        assert_eq!(cli.mode, Mode::Still);
        assert_eq!(cli.tick_ms, 500);
        assert_eq!(cli.source, PathBuf::from("color.js"));
        assert!(!cli.once && !cli.preview);
    }

    #[test]
    fn cli_animated_with_preset() {
        let cli = Cli::try_parse_from([
            "gridlet-studio", "--mode", "animated", "--preset", "ripple", "--tick-ms", "100",
        ])
        .unwrap();
        assert_eq!(Variant::from(cli.mode), Variant::Animated);
        assert_eq!(cli.preset.as_deref(), Some("ripple"));
        assert_eq!(cli.tick_ms, 100);
    }

    #[test]
    fn cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["gridlet-studio", "--mode", "video"]).is_err());
    }
}
