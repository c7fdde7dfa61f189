//! Change notifications emitted by the runner.
//!
//! Every mutation of the run state publishes one [`RunEvent`] on an
//! [`EventBus`]. Subscribers re-read the state they care about; the event
//! payload only says what changed.

use tokio::sync::broadcast;

/// Something changed in the run state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A run started (or an empty run finished immediately after this).
    RunStarted { total: usize },
    /// A step moved to `Running`.
    StepStarted { step_id: String, index: usize },
    /// A step completed.
    StepCompleted { step_id: String, index: usize },
    /// A step failed.
    StepFailed {
        step_id: String,
        index: usize,
        error: String,
    },
    /// A step is waiting for sign-off; the run is paused.
    StepAwaitingReview { step_id: String, index: usize },
    /// A step waiting for review was approved.
    StepApproved { step_id: String, index: usize },
    /// Every step completed.
    RunCompleted { elapsed_ms: u64 },
    /// A step failure ended the run. `blocked` lists steps that never ran.
    RunFailed {
        step_id: String,
        elapsed_ms: u64,
        blocked: Vec<String>,
    },
    /// The run was reset to its initial state.
    RunReset,
    /// The upload set changed.
    FilesChanged { count: usize },
}

impl RunEvent {
    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::RunCompleted { .. } | RunEvent::RunFailed { .. })
    }
}

/// Broadcasts events to every subscriber.
#[derive(Debug)]
pub struct EventBus<E> {
    tx: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event; returns how many subscribers received it.
    ///
    /// A slow subscriber loses its oldest events rather than blocking the
    /// runner.
    pub fn publish(&self, event: E) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(256)
    }
}
