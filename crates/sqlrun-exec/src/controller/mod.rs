//! Run orchestration
//!
//! The controller owns the background task a run executes on and hands
//! the caller a [`RunHandle`]: events out, decisions in, cancellation at
//! unit boundaries, and the final report through `wait`.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use sqlrun_core::{
    ConnectionParams, Decision, Driver, Result, RunReport, ScriptSource, SqlRunError,
};

use crate::runner::{RunEvent, RunShared, Runner};

/// Starts runs and enforces the one-active-run rule.
pub struct Controller {
    driver: Arc<dyn Driver>,
    active: Mutex<Option<Arc<RunShared>>>,
}

impl Controller {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            active: Mutex::new(None),
        }
    }

    /// Start a run over `sources` in the given order.
    ///
    /// Fails with a usage error while a previous run is unfinished. The
    /// run executes on a background task immediately; the returned handle
    /// is the only way to observe or steer it.
    pub fn start(
        &self,
        sources: Vec<ScriptSource>,
        params: ConnectionParams,
    ) -> Result<RunHandle> {
        let mut active = self.active.lock();
        if let Some(shared) = active.as_ref()
            && !shared.is_finished()
        {
            return Err(SqlRunError::Usage("a run is already active".into()));
        }

        let run_id = Uuid::new_v4();
        let shared = Arc::new(RunShared::default());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let runner = Runner::new(run_id, Arc::clone(&self.driver), events_tx, Arc::clone(&shared));
        let task = tokio::spawn(runner.run(sources, params));

        *active = Some(Arc::clone(&shared));
        tracing::info!(run_id = %run_id, "run started");

        Ok(RunHandle {
            run_id,
            events: events_rx,
            shared,
            task: Some(task),
        })
    }
}

/// Caller-side handle to one run.
///
/// Dropping an unfinished handle cancels the run so the background task
/// can never park forever on a decision nobody will deliver.
pub struct RunHandle {
    run_id: Uuid,
    events: mpsc::UnboundedReceiver<RunEvent>,
    shared: Arc<RunShared>,
    task: Option<JoinHandle<Result<RunReport>>>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next progress event, or `None` once the run is over and the
    /// channel drained. `RunFinished` is always the last event.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Deliver the decision for the outstanding request. Usage error when
    /// no request is outstanding.
    pub fn respond(&self, decision: Decision) -> Result<()> {
        self.shared.respond(decision)
    }

    /// Stop the run: takes effect at the active suspension point, or at
    /// the next unit boundary. An in-flight unit is left to complete.
    pub fn cancel(&self) {
        tracing::info!(run_id = %self.run_id, "cancel requested");
        self.shared.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.shared.is_finished()
    }

    /// Wait for the run to finish and take its report.
    ///
    /// A run suspended on a decision finishes only after `respond` or
    /// `cancel`, so settle those before waiting. Connection failures
    /// surface here as `SqlRunError::Connection`.
    pub async fn wait(mut self) -> Result<RunReport> {
        let task = self
            .task
            .take()
            .ok_or_else(|| SqlRunError::Unexpected("run already joined".into()))?;
        match task.await {
            Ok(result) => result,
            Err(join_error) => Err(SqlRunError::Unexpected(format!(
                "run task failed: {join_error}"
            ))),
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if !self.shared.is_finished() {
            self.shared.cancel();
        }
    }
}
