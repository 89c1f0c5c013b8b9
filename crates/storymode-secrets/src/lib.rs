//! Storymode — easter-egg and secret-level tracking.
//!
//! An explicitly constructed tracker the composition root owns and feeds
//! key and click events into. Keyboard/DOM listeners belong to the
//! presentation layer; this crate only decides what those inputs mean.

mod tracker;

pub use tracker::{KONAMI_SEQUENCE, SECRET_LEVEL_EGG_COUNT, SecretEvent, SecretTracker};
