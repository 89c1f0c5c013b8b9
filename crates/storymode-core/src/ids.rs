//! Identifier types for sections and levels.
//!
//! The presentation layer reports raw DOM section ids; the tracker only ever
//! works with these typed forms. The intro hero section is a sentinel, not a
//! level, so it gets its own variant instead of a magic string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The raw DOM id reserved for the intro hero section.
pub const INTRO_DOM_ID: &str = "intro";

/// Stable string key identifying one level in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    /// Creates a level id from a raw string key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw string key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LevelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A section as reported by the visibility source: either the intro sentinel
/// or a level section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionId {
    /// The intro hero section.
    Intro,
    /// A level section, keyed by its level id.
    Level(LevelId),
}

impl SectionId {
    /// Maps a raw DOM section id to its typed form.
    #[must_use]
    pub fn from_dom_id(raw: &str) -> Self {
        if raw == INTRO_DOM_ID {
            Self::Intro
        } else {
            Self::Level(LevelId::new(raw))
        }
    }

    /// Returns the level id when this section is a level section.
    #[must_use]
    pub fn as_level(&self) -> Option<&LevelId> {
        match self {
            Self::Intro => None,
            Self::Level(id) => Some(id),
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intro => f.write_str(INTRO_DOM_ID),
            Self::Level(id) => id.fmt(f),
        }
    }
}

impl From<String> for SectionId {
    fn from(raw: String) -> Self {
        Self::from_dom_id(&raw)
    }
}

impl From<SectionId> for String {
    fn from(section: SectionId) -> Self {
        section.to_string()
    }
}
