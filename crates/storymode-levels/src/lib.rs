//! Storymode — the fixed level catalog.
//!
//! Levels are authored data: defined once at startup, validated, and never
//! mutated afterwards. Everything downstream treats the catalog as the
//! source of truth for which ids exist and which of them are completable.

pub mod catalog;
pub mod level;

pub use catalog::{CatalogError, LevelCatalog};
pub use level::Level;
