//! Storymode replay driver — the composition root.
//!
//! Wires a catalog, a tracker runtime, and a secret tracker together, then
//! drives them from a scripted visitor session, logging every published
//! snapshot and printing the final state. This is the stand-in for the
//! page's mount/unmount lifecycle: spawn on mount, shutdown on unmount.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use storymode_core::clock::SystemClock;
use storymode_core::ids::{LevelId, SectionId};
use storymode_levels::LevelCatalog;
use storymode_progress::TrackerConfig;
use storymode_runtime::TrackerRuntime;
use storymode_secrets::SecretTracker;
use tracing_subscriber::EnvFilter;

mod script;

use script::{ReplayScript, ScriptInput};

/// Reads a millisecond duration from the environment, with a default.
fn duration_from_env(name: &str, default_ms: u64) -> Result<Duration, Box<dyn Error>> {
    match std::env::var(name) {
        Ok(raw) => {
            let ms: u64 = raw
                .parse()
                .map_err(|e| format!("{name} must be a millisecond count: {e}"))?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Storymode replay driver");

    // Read configuration from environment.
    let script_path =
        std::env::var("REPLAY_SCRIPT").unwrap_or_else(|_| "demos/session.yaml".to_string());
    let overlay_duration = duration_from_env("OVERLAY_MS", 2000)?;
    let toast_duration = duration_from_env("TOAST_MS", 3000)?;

    let catalog = match std::env::var("CATALOG_PATH") {
        Ok(path) => LevelCatalog::from_yaml(&std::fs::read_to_string(path)?)?,
        Err(_) => LevelCatalog::built_in(),
    };

    let script = ReplayScript::from_yaml(&std::fs::read_to_string(&script_path)?)?;
    tracing::info!(script = %script_path, steps = script.steps.len(), "script loaded");

    // Mount: one runtime and one secret tracker per session.
    let config = TrackerConfig {
        overlay_duration,
        toast_duration,
    };
    let runtime = TrackerRuntime::spawn(catalog, config, Arc::new(SystemClock));
    tracing::info!(session = %runtime.session_id(), "session started");

    let handle = runtime.handle();
    let mut secrets = SecretTracker::new();

    // Log every published snapshot while the script runs.
    let mut snapshots = handle.snapshots();
    let watcher = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow().clone();
            let state =
                serde_json::to_string(&snapshot).expect("snapshot serialization is infallible");
            tracing::info!(state = %state, "narrative state changed");
        }
    });

    let started = tokio::time::Instant::now();
    for step in script.steps {
        tokio::time::sleep_until(started + Duration::from_millis(step.at_ms)).await;
        match step.input {
            ScriptInput::SectionVisible { section, ratio } => {
                handle.report_section_visible(SectionId::from_dom_id(&section), ratio)?;
            }
            ScriptInput::ScrollProgress { fraction } => {
                handle.report_scroll_progress(fraction)?;
            }
            ScriptInput::LevelCompleted { level } => {
                handle.mark_level_complete(LevelId::new(level))?;
            }
            ScriptInput::KeyPressed { code } => {
                if let Some(event) = secrets.record_key(&code) {
                    tracing::info!(?event, "secret event");
                }
            }
            ScriptInput::EggClicked { egg } => {
                for event in secrets.record_egg_click(&egg) {
                    tracing::info!(?event, "secret event");
                }
            }
        }
    }

    // Let trailing overlay/toast timers resolve before tearing down.
    tokio::time::sleep(overlay_duration.max(toast_duration) + Duration::from_millis(250)).await;

    // Unmount.
    let final_state = handle.snapshot();
    runtime.shutdown().await?;
    watcher.await?;

    println!("{}", serde_json::to_string_pretty(&final_state)?);
    Ok(())
}
