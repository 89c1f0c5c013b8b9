//! Catalog fixture shared across test suites.

use storymode_levels::LevelCatalog;

/// The ten-entry catalog every test suite runs against.
///
/// This is the shipped catalog: tests exercise the same ids, ordinals, and
/// completable count the site does, so formula assertions (nine completable
/// levels) hold in both places.
#[must_use]
pub fn test_catalog() -> LevelCatalog {
    LevelCatalog::built_in()
}
