//! Storymode — the narrative progress tracker.
//!
//! Converts continuous scroll and intersection signals into discrete
//! narrative state: the active section, completed levels, one-shot curtain
//! overlays, and content-reveal gating. The tracker is a pure reducer over
//! an inbound event union; timers are requested as effects and fed back in
//! as events by the runtime.

pub mod events;
pub mod snapshot;
pub mod tracker;

pub use events::{Effect, TrackerEvent, VisitorEvent};
pub use snapshot::ProgressSnapshot;
pub use tracker::{CurtainPhase, ProgressTracker, TrackerConfig, VISIBILITY_THRESHOLD};
