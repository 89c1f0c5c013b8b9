//! Runtime error types.

use thiserror::Error;

/// Errors surfaced by the tracker runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// An event was dispatched after the runtime shut down.
    #[error("tracker runtime has been disposed")]
    Disposed,

    /// The event-loop task could not be joined during shutdown.
    #[error("tracker task failed to join: {0}")]
    Join(String),
}
