//! Read-only snapshots of tracker state.
//!
//! The presentation layer never touches the tracker directly; it consumes
//! these value snapshots. Equality is what the runtime uses to decide
//! whether a state change is worth publishing, so the raw scroll fraction
//! is deliberately absent — only the derived timeline index is visible.

use std::collections::BTreeSet;

use serde::Serialize;
use storymode_core::ids::{LevelId, SectionId};

use crate::tracker::ProgressTracker;

/// One observable state of the narrative session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// The section currently considered in view.
    pub active_section: SectionId,
    /// Ids of completed levels, for navigation-dot styling.
    pub completed: BTreeSet<LevelId>,
    /// Completion percentage for the HUD progress bar.
    pub percent_complete: u8,
    /// The level whose curtain overlay is up, if any.
    pub overlay_active: Option<LevelId>,
    /// The level whose completion toast is up, if any.
    pub toast_active: Option<LevelId>,
    /// Ids of levels whose full content subtree may mount.
    pub content_revealed: BTreeSet<LevelId>,
    /// The timeline entry selected by the pinned-scroll variant.
    pub timeline_index: usize,
}

impl ProgressSnapshot {
    /// Captures the tracker's current state.
    #[must_use]
    pub fn of(tracker: &ProgressTracker) -> Self {
        Self {
            active_section: tracker.active_section().clone(),
            completed: tracker.completed_levels().cloned().collect(),
            percent_complete: tracker.progress_percent(),
            overlay_active: tracker.overlay_active().cloned(),
            toast_active: tracker.toast_active().cloned(),
            content_revealed: tracker.revealed_levels().cloned().collect(),
            timeline_index: tracker.timeline_index(),
        }
    }
}
