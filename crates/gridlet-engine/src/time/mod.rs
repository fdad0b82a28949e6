//! Time subsystem.
//!
//! Drives animation with logical time rather than wall-clock time:
//! - one `TimeCounter` per animated session, advanced by exactly one per tick
//! - one `AnimationScheduler` owning the counter and the single timer task
//!
//! Ticks are delivered as messages so the host loop handles them one at a
//! time, interleaved with edit events.

mod counter;
mod scheduler;

pub use counter::TimeCounter;
pub use scheduler::{AnimationScheduler, SchedulerState, Tick, DEFAULT_TICK_INTERVAL};
