//! The tracker event loop and its handles.

use std::sync::Arc;
use std::time::Duration;

use storymode_core::clock::Clock;
use storymode_core::ids::{LevelId, SectionId};
use storymode_levels::LevelCatalog;
use storymode_progress::{
    Effect, ProgressSnapshot, ProgressTracker, TrackerConfig, TrackerEvent, VisitorEvent,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::error::RuntimeError;

/// A running tracker session: the spawned event loop plus its teardown
/// signal. One instance exists per page load; dropping it (or calling
/// [`TrackerRuntime::shutdown`]) ends the loop and cancels pending timers.
#[derive(Debug)]
pub struct TrackerRuntime {
    session_id: Uuid,
    handle: TrackerHandle,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TrackerRuntime {
    /// Spawns the event loop over a fresh tracker at the initial page state.
    #[must_use]
    pub fn spawn(catalog: LevelCatalog, config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        let tracker = ProgressTracker::new(catalog, config);
        let session_id = Uuid::new_v4();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let feedback = event_tx.downgrade();
        let (snapshot_tx, snapshot_rx) = watch::channel(ProgressSnapshot::of(&tracker));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(
            run_loop(tracker, clock, event_rx, feedback, snapshot_tx, shutdown_rx)
                .instrument(info_span!("tracker", session = %session_id)),
        );

        Self {
            session_id,
            handle: TrackerHandle {
                events: event_tx,
                snapshots: snapshot_rx,
            },
            shutdown_tx,
            task,
        }
    }

    /// This session's identifier, for log correlation.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Returns a handle for dispatching events and reading snapshots.
    /// Handles are cheap to clone and stay valid across the runtime's life;
    /// after shutdown their dispatch methods return
    /// [`RuntimeError::Disposed`].
    #[must_use]
    pub fn handle(&self) -> TrackerHandle {
        self.handle.clone()
    }

    /// Stops the event loop and waits for it to wind down. Pending overlay
    /// and toast timers are cancelled, never fired: state observed before
    /// shutdown is the state there is.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Join`] if the loop task panicked.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        // The loop may already be gone; a failed send is fine.
        let _ = self.shutdown_tx.send(());
        self.task
            .await
            .map_err(|err| RuntimeError::Join(err.to_string()))
    }
}

/// Cloneable handle to a running tracker session.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    events: mpsc::UnboundedSender<TrackerEvent>,
    snapshots: watch::Receiver<ProgressSnapshot>,
}

impl TrackerHandle {
    /// Dispatches a visitor event into the session.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Disposed`] if the runtime has shut down.
    pub fn dispatch(&self, event: VisitorEvent) -> Result<(), RuntimeError> {
        self.events
            .send(event.into())
            .map_err(|_| RuntimeError::Disposed)
    }

    /// Reports a section visibility change.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Disposed`] if the runtime has shut down.
    pub fn report_section_visible(
        &self,
        section: SectionId,
        ratio: f64,
    ) -> Result<(), RuntimeError> {
        self.dispatch(VisitorEvent::SectionVisible { section, ratio })
    }

    /// Reports a pinned-scroll completion fraction.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Disposed`] if the runtime has shut down.
    pub fn report_scroll_progress(&self, fraction: f64) -> Result<(), RuntimeError> {
        self.dispatch(VisitorEvent::ScrollProgress { fraction })
    }

    /// Marks a level complete.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Disposed`] if the runtime has shut down.
    pub fn mark_level_complete(&self, level: LevelId) -> Result<(), RuntimeError> {
        self.dispatch(VisitorEvent::LevelCompleted { level })
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that yields a change notification per published snapshot.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<ProgressSnapshot> {
        self.snapshots.clone()
    }
}

/// The event loop: applies events in arrival order, schedules timer effects,
/// publishes snapshots on change, and cancels outstanding timers on exit.
async fn run_loop(
    mut tracker: ProgressTracker,
    clock: Arc<dyn Clock>,
    mut events: mpsc::UnboundedReceiver<TrackerEvent>,
    feedback: mpsc::WeakUnboundedSender<TrackerEvent>,
    snapshots: watch::Sender<ProgressSnapshot>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut timers: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            maybe_event = events.recv() => {
                let Some(event) = maybe_event else { break };
                debug!(?event, "applying event");

                for effect in tracker.apply(event, clock.as_ref()) {
                    schedule(&mut timers, &feedback, effect);
                }

                let next = ProgressSnapshot::of(&tracker);
                snapshots.send_if_modified(|current| {
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });

                // Reap finished timer tasks so the set stays small.
                while timers.try_join_next().is_some() {}
            }
        }
    }

    // Teardown: a timer firing past this point must not mutate anything.
    timers.shutdown().await;
}

/// Realizes one effect as an abortable sleep task that feeds the matching
/// timer event back into the loop. The weak sender makes a late firing
/// harmless: once the runtime is gone there is nothing left to upgrade.
fn schedule(
    timers: &mut JoinSet<()>,
    feedback: &mpsc::WeakUnboundedSender<TrackerEvent>,
    effect: Effect,
) {
    let (event, after) = match effect {
        Effect::DismissOverlay { level, after } => (TrackerEvent::OverlayElapsed { level }, after),
        Effect::DismissToast { level, after } => (TrackerEvent::ToastElapsed { level }, after),
    };

    let feedback = feedback.clone();
    timers.spawn(async move {
        tokio::time::sleep(after).await;
        if let Some(sender) = feedback.upgrade() {
            let _ = sender.send(event);
        }
    });
}

/// Waits until the published snapshot satisfies `predicate`, up to `limit`.
/// Intended for tests and the replay driver; returns the first matching
/// snapshot, or `None` on timeout or runtime shutdown.
pub async fn wait_for_snapshot(
    receiver: &mut watch::Receiver<ProgressSnapshot>,
    limit: Duration,
    predicate: impl Fn(&ProgressSnapshot) -> bool,
) -> Option<ProgressSnapshot> {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        {
            let current = receiver.borrow_and_update();
            if predicate(&current) {
                return Some(current.clone());
            }
        }
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match tokio::time::timeout(remaining, receiver.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) | Err(_) => return None,
        }
    }
}
