//! Event and effect unions for the progress tracker.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use storymode_core::ids::{LevelId, SectionId};

/// Inbound events from the presentation layer.
///
/// Each variant maps to one collaborator contract: the visibility source,
/// the pinned-scroll source, and the in-content completion trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisitorEvent {
    /// A section's viewport intersection ratio changed.
    SectionVisible {
        /// The section the observer reported.
        section: SectionId,
        /// Fraction of the section currently within the viewport.
        ratio: f64,
    },
    /// The pinned scroll region reported a new completion fraction.
    ScrollProgress {
        /// Scroll completion over the pinned region, expected in [0, 1].
        fraction: f64,
    },
    /// The visitor activated a level's completion control.
    LevelCompleted {
        /// The level the control belongs to.
        level: LevelId,
    },
}

/// Full event union consumed by the reducer: visitor events plus the timer
/// firings the runtime feeds back into the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// An event from the presentation layer.
    Visitor(VisitorEvent),
    /// The curtain overlay for `level` finished its fixed display duration.
    OverlayElapsed {
        /// The level whose overlay timer fired.
        level: LevelId,
    },
    /// The completion toast for `level` finished its fixed display duration.
    ToastElapsed {
        /// The level whose toast timer fired.
        level: LevelId,
    },
}

impl From<VisitorEvent> for TrackerEvent {
    fn from(event: VisitorEvent) -> Self {
        Self::Visitor(event)
    }
}

/// Deferred work the reducer asks the runtime to schedule.
///
/// Effects are requests, not mutations: the runtime realizes each one as a
/// cancellable timer that eventually feeds a [`TrackerEvent`] back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Schedule [`TrackerEvent::OverlayElapsed`] for `level` after `after`.
    DismissOverlay {
        /// The level whose overlay is showing.
        level: LevelId,
        /// The overlay's fixed display duration.
        after: Duration,
    },
    /// Schedule [`TrackerEvent::ToastElapsed`] for `level` after `after`.
    DismissToast {
        /// The level whose toast is showing.
        level: LevelId,
        /// The toast's fixed display duration.
        after: Duration,
    },
}
