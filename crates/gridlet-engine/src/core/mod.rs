//! Session-level contracts.
//!
//! This module defines the interface between a host (terminal studio, tests,
//! any other front end) and the engine: the editor collaborator, the events
//! a host posts, and the single-threaded loop that reacts to them.

mod editor;
mod session;

pub use editor::{Editor, EditorBuffer};
pub use session::{Session, SessionConfig, SessionControl, SessionEvent, Variant};
