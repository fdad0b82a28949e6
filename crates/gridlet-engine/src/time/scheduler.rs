use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::TimeCounter;

/// Default logical tick period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// One timer firing, stamped with the run that produced it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Tick {
    pub generation: u64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Handle to the running timer task. Dropping it cancels the task.
#[derive(Debug)]
struct TimerHandle {
    task: JoinHandle<()>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owns the animation time and the one timer that advances it.
///
/// The timer task only posts [`Tick`]s into the host's queue; time advances
/// when the host hands a tick back through [`on_tick`](Self::on_tick).
/// Every `start` bumps the generation, so ticks that were already queued by
/// a cancelled run are recognized and dropped. At most one tick stream is
/// ever accepted.
#[derive(Debug)]
pub struct AnimationScheduler {
    time: TimeCounter,
    timer: Option<TimerHandle>,
    generation: u64,
    interval: Duration,
    ticks: mpsc::UnboundedSender<Tick>,
}

impl AnimationScheduler {
    /// Creates an idle scheduler posting ticks to `ticks`.
    ///
    /// A zero `interval` is raised to one millisecond.
    pub fn new(interval: Duration, ticks: mpsc::UnboundedSender<Tick>) -> Self {
        Self {
            time: TimeCounter::new(),
            timer: None,
            generation: 0,
            interval: interval.max(Duration::from_millis(1)),
            ticks,
        }
    }

    /// Creates an idle scheduler together with the receiving end of its
    /// tick queue.
    pub fn channel(interval: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(interval, tx), rx)
    }

    /// Cancels any running timer, resets time to 0 and schedules a new
    /// repeating tick, first firing one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        // Cancel before installing the replacement.
        self.timer = None;
        self.generation += 1;
        self.time.reset();

        let generation = self.generation;
        let period = self.interval;
        let ticks = self.ticks.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(Tick { generation }).is_err() {
                    break;
                }
            }
        });
        self.timer = Some(TimerHandle { task });
        log::debug!("animation started (generation {generation}, every {period:?})");
    }

    /// Same as [`start`](Self::start).
    #[inline]
    pub fn restart(&mut self) {
        self.start();
    }

    /// Cancels the timer. Time keeps its last value.
    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            log::debug!("animation stopped at time {}", self.time.get());
        }
    }

    /// Accepts a tick from the current run and returns the advanced time;
    /// returns `None` for ticks from a cancelled run or while idle.
    pub fn on_tick(&mut self, tick: Tick) -> Option<u64> {
        if self.timer.is_none() || tick.generation != self.generation {
            log::trace!("dropping stale tick (generation {} != {})", tick.generation, self.generation);
            return None;
        }
        Some(self.time.advance())
    }

    #[inline]
    pub fn time(&self) -> u64 {
        self.time.get()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        if self.timer.is_some() { SchedulerState::Running } else { SchedulerState::Idle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> (AnimationScheduler, mpsc::UnboundedReceiver<Tick>) {
        AnimationScheduler::channel(DEFAULT_TICK_INTERVAL)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Tick>) -> Tick {
        rx.recv().await.expect("tick channel closed")
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn starts_idle() {
        let (mut s, _rx) = scheduler();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.time(), 0);
        assert_eq!(s.on_tick(Tick { generation: 0 }), None);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_interval() {
        let (mut s, mut rx) = scheduler();
        let t0 = Instant::now();
        s.start();
        assert_eq!(s.state(), SchedulerState::Running);
        let tick = next(&mut rx).await;
        assert_eq!(t0.elapsed(), DEFAULT_TICK_INTERVAL);
        assert_eq!(s.on_tick(tick), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn each_tick_advances_by_exactly_one() {
        let (mut s, mut rx) = scheduler();
        s.start();
        let mut last = Instant::now();
        for expected in 1..=6 {
            let tick = next(&mut rx).await;
            assert_eq!(last.elapsed(), DEFAULT_TICK_INTERVAL);
            last = Instant::now();
            assert_eq!(s.on_tick(tick), Some(expected));
        }
    }

    // ── restart ───────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn restart_resets_time_to_zero() {
        let (mut s, mut rx) = scheduler();
        s.start();
        for _ in 0..3 {
            let tick = next(&mut rx).await;
            s.on_tick(tick);
        }
        assert_eq!(s.time(), 3);

        s.restart();
        assert_eq!(s.time(), 0);
        let tick = next(&mut rx).await;
        assert_eq!(s.on_tick(tick), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn queued_tick_from_previous_run_is_dropped() {
        let (mut s, mut rx) = scheduler();
        s.start();
        let stale = next(&mut rx).await;

        s.restart();
        assert_eq!(s.on_tick(stale), None);
        assert_eq!(s.time(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_restarts_leave_one_stream() {
        let (mut s, mut rx) = scheduler();
        for _ in 0..5 {
            s.restart();
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        let generation = s.generation();
        assert_eq!(generation, 5);

        let mut seen = Vec::new();
        for _ in 0..4 {
            let tick = next(&mut rx).await;
            assert_eq!(tick.generation, generation);
            seen.push(s.on_tick(tick));
        }
        assert_eq!(seen, vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    // ── stop ──────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_timer() {
        let (mut s, mut rx) = scheduler();
        s.start();
        s.stop();
        assert_eq!(s.state(), SchedulerState::Idle);
        tokio::time::sleep(DEFAULT_TICK_INTERVAL * 4).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scheduler_closes_queue() {
        let (mut s, mut rx) = scheduler();
        s.start();
        drop(s);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval() {
        let (mut s, mut rx) = AnimationScheduler::channel(Duration::from_millis(40));
        let t0 = Instant::now();
        s.start();
        let tick = next(&mut rx).await;
        assert_eq!(t0.elapsed(), Duration::from_millis(40));
        assert_eq!(s.on_tick(tick), Some(1));
    }
}
