//! Secret tracker: Konami detection, egg clicks, secret-level unlock.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

/// The key-code sequence that toggles hacker mode.
pub const KONAMI_SEQUENCE: [&str; 10] = [
    "ArrowUp",
    "ArrowUp",
    "ArrowDown",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "ArrowLeft",
    "ArrowRight",
    "KeyB",
    "KeyA",
];

/// Distinct eggs required to unlock the secret level.
pub const SECRET_LEVEL_EGG_COUNT: usize = 3;

/// Observable outcomes of feeding inputs to the [`SecretTracker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretEvent {
    /// The Konami sequence completed with hacker mode off.
    HackerModeEnabled,
    /// The Konami sequence completed with hacker mode on.
    HackerModeDisabled,
    /// A not-previously-seen egg was clicked.
    EggFound {
        /// The egg's identifier.
        egg: String,
    },
    /// The third distinct egg was found. Fires once per session.
    SecretLevelUnlocked,
}

/// Session-scoped secret state. Created by the composition root; the page
/// discards it on unmount like every other per-session tracker.
#[derive(Debug, Default)]
pub struct SecretTracker {
    konami_index: usize,
    hacker_mode: bool,
    eggs_found: BTreeSet<String>,
    secret_level_unlocked: bool,
}

impl SecretTracker {
    /// Creates a tracker with nothing discovered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one key code into the Konami detector.
    ///
    /// A mismatched key resets the detector but still counts as a fresh
    /// start when it matches the sequence head, so `Up Up Up Down ...`
    /// eventually completes.
    pub fn record_key(&mut self, code: &str) -> Option<SecretEvent> {
        if code == KONAMI_SEQUENCE[self.konami_index] {
            self.konami_index += 1;
        } else if code == KONAMI_SEQUENCE[0] {
            self.konami_index = 1;
        } else {
            self.konami_index = 0;
        }

        if self.konami_index < KONAMI_SEQUENCE.len() {
            return None;
        }

        self.konami_index = 0;
        self.hacker_mode = !self.hacker_mode;
        info!(enabled = self.hacker_mode, "hacker mode toggled");

        Some(if self.hacker_mode {
            SecretEvent::HackerModeEnabled
        } else {
            SecretEvent::HackerModeDisabled
        })
    }

    /// Records a click on an egg-bearing element.
    ///
    /// Emits [`SecretEvent::EggFound`] on first discovery only; clicking the
    /// same egg again is inert. The secret level unlocks exactly once, at
    /// the third distinct egg.
    pub fn record_egg_click(&mut self, egg: &str) -> Vec<SecretEvent> {
        if !self.eggs_found.insert(egg.to_owned()) {
            return Vec::new();
        }

        let mut events = vec![SecretEvent::EggFound {
            egg: egg.to_owned(),
        }];
        info!(egg, total = self.eggs_found.len(), "easter egg found");

        if self.eggs_found.len() >= SECRET_LEVEL_EGG_COUNT && !self.secret_level_unlocked {
            self.secret_level_unlocked = true;
            events.push(SecretEvent::SecretLevelUnlocked);
        }

        events
    }

    /// Whether hacker mode is currently on.
    #[must_use]
    pub fn hacker_mode(&self) -> bool {
        self.hacker_mode
    }

    /// How many distinct eggs have been found.
    #[must_use]
    pub fn eggs_found(&self) -> usize {
        self.eggs_found.len()
    }

    /// Whether the secret level has been unlocked.
    #[must_use]
    pub fn secret_level_unlocked(&self) -> bool {
        self.secret_level_unlocked
    }
}
