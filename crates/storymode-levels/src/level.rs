//! Level catalog entries.

use serde::{Deserialize, Serialize};
use storymode_core::ids::LevelId;

/// One narrative chapter in the fixed catalog.
///
/// Ordinal 0 is the intro entry; it occupies a catalog slot (the timeline
/// renders it) but is never completable and never gets a curtain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Stable string key.
    pub id: LevelId,
    /// 0-based position in the timeline.
    pub ordinal: u8,
    /// Display title shown on the curtain and the HUD.
    pub title: String,
    /// Display year shown next to the timeline entry.
    pub year_tag: String,
}

impl Level {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(
        id: impl Into<LevelId>,
        ordinal: u8,
        title: impl Into<String>,
        year_tag: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            ordinal,
            title: title.into(),
            year_tag: year_tag.into(),
        }
    }

    /// Whether this entry can be marked complete by the visitor.
    #[must_use]
    pub fn is_completable(&self) -> bool {
        self.ordinal > 0
    }
}
