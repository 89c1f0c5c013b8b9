//! The validated, immutable level catalog.

use std::collections::HashMap;

use serde::Deserialize;
use storymode_core::ids::LevelId;
use thiserror::Error;

use crate::level::Level;

/// Validation errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog must contain at least the intro entry and one level.
    #[error("catalog must contain at least two entries, got {0}")]
    TooFewEntries(usize),

    /// Two entries share the same id.
    #[error("duplicate level id: {0}")]
    DuplicateId(LevelId),

    /// Entry ordinals must run 0..n in catalog order.
    #[error("ordinal mismatch at position {position}: expected {position}, found {found}")]
    OrdinalMismatch {
        /// Position of the offending entry.
        position: usize,
        /// The ordinal the entry carried.
        found: u8,
    },

    /// A YAML catalog definition failed to parse.
    #[error("catalog definition failed to parse: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// The ordered, fixed set of levels for one site build.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<Level>,
    by_id: HashMap<LevelId, usize>,
}

impl LevelCatalog {
    /// Builds a catalog from entries ordered by ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog has fewer than two entries,
    /// contains a duplicate id, or its ordinals are not `0..n` in order.
    pub fn new(levels: Vec<Level>) -> Result<Self, CatalogError> {
        if levels.len() < 2 {
            return Err(CatalogError::TooFewEntries(levels.len()));
        }

        let mut by_id = HashMap::with_capacity(levels.len());
        for (position, level) in levels.iter().enumerate() {
            if usize::from(level.ordinal) != position {
                return Err(CatalogError::OrdinalMismatch {
                    position,
                    found: level.ordinal,
                });
            }
            if by_id.insert(level.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(level.id.clone()));
            }
        }

        Ok(Self { levels, by_id })
    }

    /// Parses a YAML catalog definition: a list of level entries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on malformed YAML, or any structural
    /// validation error from [`LevelCatalog::new`].
    pub fn from_yaml(definition: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        struct Definition {
            levels: Vec<Level>,
        }

        let parsed: Definition = serde_yaml::from_str(definition)?;
        Self::new(parsed.levels)
    }

    /// The catalog shipped with the site: the intro entry plus nine levels.
    ///
    /// # Panics
    ///
    /// Never panics; the built-in table is valid by construction.
    #[must_use]
    pub fn built_in() -> Self {
        let levels = vec![
            Level::new("intro", 0, "PRESS START", "19XX"),
            Level::new("birth", 1, "THE ORIGIN STORY", "1999"),
            Level::new("cars", 2, "VEHICLE OBSESSION", "2005"),
            Level::new("abacus", 3, "THE ABACUS TRIALS", "2011"),
            Level::new("college", 4, "ACADEMIC QUEST", "2017"),
            Level::new("amazon", 5, "CORPORATE INFILTRATION", "2021"),
            Level::new("frontend", 6, "FRONTEND AWAKENING", "2022"),
            Level::new("web3", 7, "WEB3 ADVENTURE", "2023"),
            Level::new("farcaster", 8, "DECENTRALIZED SOCIAL", "2024"),
            Level::new("present", 9, "FINAL MISSION", "2025"),
        ];
        Self::new(levels).expect("built-in catalog is valid")
    }

    /// Total number of timeline entries, the intro included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the catalog holds no entries. Always false for a validated
    /// catalog; provided for the conventional `len`/`is_empty` pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of completable levels (every entry except the intro).
    #[must_use]
    pub fn completable_len(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn get(&self, id: &LevelId) -> Option<&Level> {
        self.by_id.get(id).map(|&position| &self.levels[position])
    }

    /// Looks up an entry by its timeline position.
    #[must_use]
    pub fn by_ordinal(&self, ordinal: usize) -> Option<&Level> {
        self.levels.get(ordinal)
    }

    /// Whether `id` names any catalog entry.
    #[must_use]
    pub fn contains(&self, id: &LevelId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Whether `id` names a completable level (present, and not the intro).
    #[must_use]
    pub fn is_completable(&self, id: &LevelId) -> bool {
        self.get(id).is_some_and(Level::is_completable)
    }

    /// Iterates entries in timeline order.
    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }
}
