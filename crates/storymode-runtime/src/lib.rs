//! Storymode — the runtime that drives a progress tracker.
//!
//! The tracker itself is a pure reducer; this crate gives it an event loop.
//! One spawned task owns the tracker, consumes events from an mpsc channel
//! in arrival order, realizes timer effects as abortable sleep tasks, and
//! publishes state snapshots on a watch channel whenever the observable
//! state changes. Teardown cancels every pending timer, so a dismissal that
//! would land after the owning scope is gone simply never happens.

mod error;
mod runtime;

pub use error::RuntimeError;
pub use runtime::{TrackerHandle, TrackerRuntime, wait_for_snapshot};
