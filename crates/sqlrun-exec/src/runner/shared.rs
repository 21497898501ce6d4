//! State shared between a run's background task and its handle

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use sqlrun_core::{Decision, Result, SqlRunError};

/// Crossing point between the handle (respond, cancel) and the runner
/// (park, check flags). One instance per run.
#[derive(Debug, Default)]
pub(crate) struct RunShared {
    /// Sender for the outstanding decision while the run is suspended.
    pending_decision: Mutex<Option<oneshot::Sender<Decision>>>,
    cancelled: AtomicBool,
    finished: AtomicBool,
}

impl RunShared {
    /// Park the sender the runner will wait on.
    pub(crate) fn park_decision(&self, sender: oneshot::Sender<Decision>) {
        *self.pending_decision.lock() = Some(sender);
    }

    /// Drop a parked sender without answering it.
    pub(crate) fn discard_decision(&self) {
        self.pending_decision.lock().take();
    }

    /// Deliver the decision for the outstanding request. Usage error when
    /// nothing is outstanding.
    pub(crate) fn respond(&self, decision: Decision) -> Result<()> {
        let sender = self.pending_decision.lock().take();
        match sender {
            Some(sender) => sender
                .send(decision)
                .map_err(|_| SqlRunError::Usage("the run is no longer awaiting a decision".into())),
            None => Err(SqlRunError::Usage(
                "no decision request is outstanding".into(),
            )),
        }
    }

    /// Request a stop. Resolves an active suspension immediately;
    /// otherwise the runner picks the flag up at the next unit boundary.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Flag first, then drain: the runner re-checks the flag after
        // parking, so one side always sees the other.
        if let Some(sender) = self.pending_decision.lock().take() {
            let _ = sender.send(Decision::Stop);
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}
