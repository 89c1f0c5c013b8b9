//! Scripted visitor sessions.

use serde::Deserialize;

/// A timed sequence of visitor inputs replayed against a fresh session.
#[derive(Debug, Deserialize)]
pub struct ReplayScript {
    /// Steps, ordered by `at_ms`.
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    /// Parses a YAML script.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error on malformed YAML.
    pub fn from_yaml(definition: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(definition)
    }
}

/// One scripted input with its delivery time.
#[derive(Debug, Deserialize)]
pub struct ScriptStep {
    /// Milliseconds from session start.
    pub at_ms: u64,
    /// The input to deliver.
    #[serde(flatten)]
    pub input: ScriptInput,
}

/// The inputs a script can deliver: the three visitor events plus the two
/// secret-tracker inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptInput {
    /// A section visibility report.
    SectionVisible {
        /// Raw DOM section id.
        section: String,
        /// Intersection ratio.
        ratio: f64,
    },
    /// A pinned-scroll completion fraction.
    ScrollProgress {
        /// Scroll fraction.
        fraction: f64,
    },
    /// An in-content completion action.
    LevelCompleted {
        /// The completed level's id.
        level: String,
    },
    /// A keyboard event for the Konami detector.
    KeyPressed {
        /// The key code.
        code: String,
    },
    /// A click on an egg-bearing element.
    EggClicked {
        /// The egg's identifier.
        egg: String,
    },
}
