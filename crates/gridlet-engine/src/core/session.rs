use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

use super::Editor;
use crate::presets::find_preset;
use crate::render::{FrameStats, GridConfig, GridRenderer, RenderError};
use crate::surface::Surface;
use crate::time::{AnimationScheduler, SchedulerState, Tick, DEFAULT_TICK_INTERVAL};

/// Which renderer behavior a session uses.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Variant {
    /// One frame per commit, `color(x, y)` on a 20×20 grid.
    #[default]
    Still,
    /// Timer-driven frames, `color(x, y, time)` on a 40×40 grid.
    Animated,
}

impl Variant {
    pub fn grid(self) -> GridConfig {
        match self {
            Variant::Still => GridConfig::STILL,
            Variant::Animated => GridConfig::ANIMATED,
        }
    }

    #[inline]
    pub fn is_animated(self) -> bool {
        self == Variant::Animated
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Still => "still",
            Variant::Animated => "animated",
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SessionConfig {
    pub variant: Variant,
    /// Animated variant only.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { variant: Variant::Still, tick_interval: DEFAULT_TICK_INTERVAL }
    }
}

impl SessionConfig {
    pub fn new(variant: Variant) -> Self {
        Self { variant, ..Self::default() }
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

/// Notifications a host posts to a running session.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SessionEvent {
    /// The editor text changed (per keystroke or per save).
    ContentChanged,
    /// The editor lost input focus; treated as a commit.
    FocusLost,
    /// Explicit re-render request (keyboard shortcut).
    ForceRender,
    /// Replace the editor text with the named preset.
    SelectPreset(String),
    Shutdown,
}

/// Control directive returned by event handlers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SessionControl {
    Continue,
    Exit,
}

type FrameCallback<S> = Box<dyn FnMut(&S, &FrameStats)>;

/// Ties an editor, a surface and a renderer together.
///
/// Reactions per variant:
///
/// | Event | Still | Animated |
/// |-------|-------|----------|
/// | startup | render | restart, render time 0 |
/// | `ContentChanged` | nothing | restart, render time 0 |
/// | `FocusLost` | render | nothing |
/// | `ForceRender` | render | restart, render time 0 |
/// | `SelectPreset` | replace text, render | replace text, restart, render time 0 |
/// | accepted tick | n/a | render at the new time |
///
/// Every render recompiles from the editor's current text.
pub struct Session<E, S> {
    config: SessionConfig,
    editor: E,
    surface: Option<S>,
    renderer: GridRenderer,
    scheduler: Option<AnimationScheduler>,
    ticks: Option<mpsc::UnboundedReceiver<Tick>>,
    on_frame: Option<FrameCallback<S>>,
}

impl<E: Editor, S: Surface> Session<E, S> {
    /// Creates a session without a surface; renders are skipped until one
    /// is attached.
    pub fn new(config: SessionConfig, editor: E) -> Self {
        let (scheduler, ticks) = match config.variant {
            Variant::Still => (None, None),
            Variant::Animated => {
                let (scheduler, ticks) = AnimationScheduler::channel(config.tick_interval);
                (Some(scheduler), Some(ticks))
            }
        };
        Self {
            config,
            editor,
            surface: None,
            renderer: GridRenderer::new(config.variant.grid()),
            scheduler,
            ticks,
            on_frame: None,
        }
    }

    pub fn surface(mut self, surface: S) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Replaces the renderer (custom palette or background). The grid is
    /// whatever the given renderer was built with.
    pub fn renderer(mut self, renderer: GridRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Called with the surface after every successful render.
    pub fn on_frame(mut self, f: impl FnMut(&S, &FrameStats) + 'static) -> Self {
        self.on_frame = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn surface_ref(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Current animation time; `None` in the still variant.
    pub fn time(&self) -> Option<u64> {
        self.scheduler.as_ref().map(AnimationScheduler::time)
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler
            .as_ref()
            .map_or(SchedulerState::Idle, AnimationScheduler::state)
    }

    /// Renders the editor's current text at the current time.
    pub fn render_now(&mut self) -> Result<FrameStats, RenderError> {
        let source = self.editor.value();
        let time = self.time();
        let stats = self.renderer.render(&source, time, self.surface.as_mut())?;
        if let (Some(on_frame), Some(surface)) = (self.on_frame.as_mut(), self.surface.as_ref()) {
            on_frame(surface, &stats);
        }
        Ok(stats)
    }

    /// Startup behavior: a first frame, and for the animated variant a
    /// running timer. The animated variant needs a tokio runtime.
    pub fn start(&mut self) {
        log::info!("{} session started", self.config.variant);
        self.commit();
    }

    /// Handles one event to completion.
    pub fn handle(&mut self, event: SessionEvent) -> SessionControl {
        log::debug!("event: {event:?}");
        match event {
            SessionEvent::ContentChanged => {
                if self.config.variant.is_animated() {
                    self.restart_animation();
                }
            }
            SessionEvent::FocusLost => {
                if !self.config.variant.is_animated() {
                    self.render_logged();
                }
            }
            SessionEvent::ForceRender => self.commit(),
            SessionEvent::SelectPreset(name) => match find_preset(&name) {
                Some(preset) => {
                    log::info!("loading preset `{}`", preset.name);
                    self.editor.set_value(preset.source);
                    self.commit();
                }
                None => log::warn!("unknown preset `{name}`"),
            },
            SessionEvent::Shutdown => return SessionControl::Exit,
        }
        SessionControl::Continue
    }

    /// Renders at the advanced time if `tick` belongs to the current run.
    pub fn handle_tick(&mut self, tick: Tick) -> SessionControl {
        let advanced = self.scheduler.as_mut().and_then(|s| s.on_tick(tick));
        if advanced.is_some() {
            self.render_logged();
        }
        SessionControl::Continue
    }

    /// Runs until `Shutdown` arrives or every event sender is dropped.
    ///
    /// Events and ticks are handled one at a time on the calling task; a
    /// pending event is handled before a pending tick.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        self.start();
        loop {
            let control = tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => SessionControl::Exit,
                },
                Some(tick) = next_tick(&mut self.ticks) => self.handle_tick(tick),
            };
            if control == SessionControl::Exit {
                break;
            }
        }
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.stop();
        }
        log::info!("session ended");
    }

    fn commit(&mut self) {
        if self.config.variant.is_animated() {
            self.restart_animation();
        } else {
            self.render_logged();
        }
    }

    fn restart_animation(&mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.restart();
        }
        self.render_logged();
    }

    /// Render failures are already logged by the renderer.
    fn render_logged(&mut self) {
        if let Ok(stats) = self.render_now() {
            log::trace!("frame: {stats:?}");
        }
    }
}

async fn next_tick(ticks: &mut Option<mpsc::UnboundedReceiver<Tick>>) -> Option<Tick> {
    match ticks {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::EditorBuffer;
    use crate::paint::palette::DEFAULT_COLORS;
    use crate::paint::Color;
    use crate::surface::PixelSurface;

    const DIAGONAL: &str = "function color(x, y) { return (x + y) % 10 }";
    const SHIFT: &str = "function color(x, y, t) { return (x + t) % 10 }";

    type Frames = Rc<RefCell<Vec<(Option<u64>, Color)>>>;
    type Shared = Rc<RefCell<EditorBuffer>>;

    fn session(variant: Variant, src: &str) -> (Session<Shared, PixelSurface>, Shared, Frames) {
        let editor = Rc::new(RefCell::new(EditorBuffer::new(src)));
        let frames: Frames = Rc::default();
        let sink = Rc::clone(&frames);
        let s = Session::new(SessionConfig::new(variant), Rc::clone(&editor))
            .surface(PixelSurface::default())
            .on_frame(move |surface, stats| {
                let px = surface.pixel(0, 0).unwrap_or_default();
                sink.borrow_mut().push((stats.time, px));
            });
        (s, editor, frames)
    }

    fn times(frames: &Frames) -> Vec<Option<u64>> {
        frames.borrow().iter().map(|(t, _)| *t).collect()
    }

    // ── still ─────────────────────────────────────────────────────────────

    #[test]
    fn still_renders_at_startup() {
        let (mut s, _, frames) = session(Variant::Still, DIAGONAL);
        s.start();
        assert_eq!(*frames.borrow(), vec![(None, DEFAULT_COLORS[0])]);
        assert_eq!(s.surface_ref().map(PixelSurface::width), Some(400));
    }

    #[test]
    fn still_waits_for_focus_loss() {
        let (mut s, editor, frames) = session(Variant::Still, DIAGONAL);
        s.start();
        editor.borrow_mut().set_value("function color() { return 7 }");

        assert_eq!(s.handle(SessionEvent::ContentChanged), SessionControl::Continue);
        assert_eq!(frames.borrow().len(), 1);

        s.handle(SessionEvent::FocusLost);
        assert_eq!(frames.borrow().last(), Some(&(None, DEFAULT_COLORS[7])));
    }

    #[test]
    fn still_force_render() {
        let (mut s, editor, frames) = session(Variant::Still, DIAGONAL);
        s.start();
        editor.borrow_mut().set_value("function color() { return 2 }");
        s.handle(SessionEvent::ForceRender);
        assert_eq!(frames.borrow().len(), 2);
        assert_eq!(frames.borrow()[1].1, DEFAULT_COLORS[2]);
    }

    #[test]
    fn preset_replaces_text_and_renders() {
        let (mut s, editor, frames) = session(Variant::Still, DIAGONAL);
        s.start();
        s.handle(SessionEvent::SelectPreset("checker".into()));
        assert!(editor.borrow().as_str().contains("Math.floor(x / 4)"));
        assert_eq!(frames.borrow().len(), 2);
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let (mut s, editor, frames) = session(Variant::Still, DIAGONAL);
        s.start();
        s.handle(SessionEvent::SelectPreset("does-not-exist".into()));
        assert_eq!(editor.borrow().as_str(), DIAGONAL);
        assert_eq!(frames.borrow().len(), 1);
    }

    #[test]
    fn broken_edit_keeps_last_frame() {
        let (mut s, editor, frames) = session(Variant::Still, DIAGONAL);
        s.start();
        let before = s.surface_ref().cloned();
        editor.borrow_mut().set_value("function color(x, y) {");
        s.handle(SessionEvent::FocusLost);
        assert_eq!(frames.borrow().len(), 1);
        assert_eq!(s.surface_ref().cloned(), before);
    }

    #[test]
    fn missing_surface_skips_render() {
        let mut s: Session<EditorBuffer, PixelSurface> =
            Session::new(SessionConfig::default(), EditorBuffer::new(DIAGONAL));
        s.start();
        assert_eq!(s.render_now(), Err(RenderError::MissingSurface));
    }

    #[test]
    fn shutdown_exits() {
        let (mut s, _, _) = session(Variant::Still, DIAGONAL);
        assert_eq!(s.handle(SessionEvent::Shutdown), SessionControl::Exit);
    }

    // ── animated ──────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn animated_focus_loss_does_not_render() {
        let (mut s, _, frames) = session(Variant::Animated, SHIFT);
        s.start();
        assert_eq!(s.scheduler_state(), SchedulerState::Running);
        s.handle(SessionEvent::FocusLost);
        assert_eq!(times(&frames), vec![Some(0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn animated_edit_restarts_from_zero() {
        let (mut s, editor, frames) = session(Variant::Animated, SHIFT);
        let (tx, rx) = mpsc::unbounded_channel();

        let driver = async {
            tokio::time::sleep(Duration::from_millis(1250)).await;
            editor.borrow_mut().set_value("function color(x, y, t) { return (t + 5) % 10 }");
            tx.send(SessionEvent::ContentChanged).unwrap();
            tokio::time::sleep(Duration::from_millis(600)).await;
            tx.send(SessionEvent::Shutdown).unwrap();
        };
        tokio::join!(s.run(rx), driver);

        assert_eq!(times(&frames), vec![Some(0), Some(1), Some(2), Some(0), Some(1)]);
        let colors: Vec<Color> = frames.borrow().iter().map(|(_, c)| *c).collect();
        assert_eq!(colors[2], DEFAULT_COLORS[2]);
        assert_eq!(colors[3], DEFAULT_COLORS[5]);
        assert_eq!(colors[4], DEFAULT_COLORS[6]);
        assert_eq!(s.scheduler_state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn animated_time_never_skips() {
        let (mut s, _, frames) = session(Variant::Animated, SHIFT);
        let (tx, rx) = mpsc::unbounded_channel();

        // The driver owns the only sender; dropping it ends the loop.
        let driver = async move {
            for _ in 0..3 {
                tokio::time::sleep(Duration::from_millis(700)).await;
                tx.send(SessionEvent::ForceRender).unwrap();
            }
            tokio::time::sleep(Duration::from_millis(1600)).await;
        };
        tokio::join!(s.run(rx), driver);

        let times = times(&frames);
        for pair in times.windows(2) {
            let (a, b) = (pair[0].unwrap(), pair[1].unwrap());
            assert!(b == 0 || b == a + 1, "jump from {a} to {b} in {times:?}");
        }
        assert_eq!(times.last(), Some(&Some(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn animated_preset_restarts() {
        let (mut s, editor, frames) = session(Variant::Animated, SHIFT);
        let (tx, rx) = mpsc::unbounded_channel();

        let driver = async {
            tokio::time::sleep(Duration::from_millis(1100)).await;
            tx.send(SessionEvent::SelectPreset("scroll".into())).unwrap();
            tx.send(SessionEvent::Shutdown).unwrap();
        };
        tokio::join!(s.run(rx), driver);

        assert_eq!(times(&frames), vec![Some(0), Some(1), Some(2), Some(0)]);
        assert!(editor.borrow().as_str().contains("Horizontal bands"));
    }

    #[tokio::test(start_paused = true)]
    async fn animated_ticks_continue_through_compile_errors() {
        let (mut s, editor, frames) = session(Variant::Animated, SHIFT);
        s.start();
        editor.borrow_mut().set_value("not valid (((");
        s.handle(SessionEvent::ContentChanged);
        assert_eq!(s.time(), Some(0));

        let tick = Tick { generation: 2 };
        s.handle_tick(tick);
        assert_eq!(s.time(), Some(1));
        // Only the startup frame succeeded.
        assert_eq!(times(&frames), vec![Some(0)]);
    }
}
