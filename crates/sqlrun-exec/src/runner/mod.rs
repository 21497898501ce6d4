//! Sequential run execution
//!
//! One background task owns the whole loop: connect once, walk the
//! scripts in caller order, execute each script's units in segmentation
//! order, and close the session on every way out. The only suspension
//! point is the decision rendezvous after a failure; cancellation lands
//! there or at the next unit boundary, never inside an in-flight unit.

mod shared;


use std::sync::Arc;

use tokio::sync::oneshot;
use uuid::Uuid;

use sqlrun_core::{
    ConnectionParams, Decision, DecisionRequest, Driver, ExecutionError, Result, RunReport,
    RunSummary, Script, ScriptOutcome, ScriptSource, Session, SqlRunError, Unit, UnitResult,
};

use crate::segment::segment;

pub(crate) use shared::RunShared;

/// Progress events emitted while a run executes.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A script was picked up, before its text is read.
    ScriptStarted { script_name: String },
    UnitSucceeded {
        script_name: String,
        unit: Unit,
    },
    /// `unit` is `None` when the script file itself could not be read.
    UnitFailed {
        script_name: String,
        unit: Option<Unit>,
        error: ExecutionError,
    },
    /// The run is suspended until the handle responds.
    DecisionRequired(DecisionRequest),
    /// Always the last event of a run.
    RunFinished(RunSummary),
}

pub(crate) type EventSender = tokio::sync::mpsc::UnboundedSender<RunEvent>;

/// Executes one run of scripts over one session.
pub(crate) struct Runner {
    run_id: Uuid,
    driver: Arc<dyn Driver>,
    events: EventSender,
    shared: Arc<RunShared>,
    /// Sticky for the rest of the run once IgnoreAllRemaining is chosen.
    ignore_all: bool,
}

impl Runner {
    pub(crate) fn new(
        run_id: Uuid,
        driver: Arc<dyn Driver>,
        events: EventSender,
        shared: Arc<RunShared>,
    ) -> Self {
        Self {
            run_id,
            driver,
            events,
            shared,
            ignore_all: false,
        }
    }

    /// Run every script in order.
    ///
    /// The session is opened exactly once and closed exactly once, no
    /// matter how the run ends. A connection failure finishes the run
    /// with an empty summary and surfaces the error to `wait`.
    #[tracing::instrument(skip(self, sources, params), fields(run_id = %self.run_id, scripts = sources.len()))]
    pub(crate) async fn run(
        mut self,
        sources: Vec<ScriptSource>,
        params: ConnectionParams,
    ) -> Result<RunReport> {
        tracing::info!(endpoint = %params.endpoint(), driver = %self.driver.name(), "connecting");
        let session = match self.driver.connect(&params).await {
            Ok(session) => session,
            Err(error) => {
                tracing::error!(error = %error, "connection failed");
                self.finish(RunSummary::empty());
                return Err(error);
            }
        };

        let report = self.run_scripts(session.as_ref(), &sources).await;

        // Unconditional cleanup on every path out of the loop.
        if let Err(error) = session.close().await {
            tracing::warn!(error = %error, "session close failed");
        }

        tracing::info!(
            succeeded = report.summary.success_count,
            failed = report.summary.error_count,
            stopped = report.summary.stopped,
            "run finished"
        );
        self.finish(report.summary);
        Ok(report)
    }

    async fn run_scripts(&mut self, session: &dyn Session, sources: &[ScriptSource]) -> RunReport {
        let mut outcomes: Vec<ScriptOutcome> = Vec::new();
        let mut stopped = false;

        for source in sources {
            if self.shared.is_cancelled() {
                tracing::info!(script = %source.display_name, "cancelled before script");
                stopped = true;
                break;
            }

            self.emit(RunEvent::ScriptStarted {
                script_name: source.display_name.clone(),
            });
            tracing::info!(script = %source.display_name, "script started");

            let mut outcome = ScriptOutcome::new(source);

            let raw_text = match tokio::fs::read_to_string(&source.path).await {
                Ok(text) => text,
                Err(io_error) => {
                    let error = SqlRunError::FileRead {
                        path: source.path.clone(),
                        message: io_error.to_string(),
                    };
                    tracing::warn!(script = %source.display_name, error = %error, "script unreadable");
                    outcome.read_error = Some(error.to_string());
                    self.emit(RunEvent::UnitFailed {
                        script_name: source.display_name.clone(),
                        unit: None,
                        error: ExecutionError::new(error.to_string()),
                    });

                    let decision = self
                        .resolve_failure(&source.display_name, None, error.to_string())
                        .await;
                    match decision {
                        Decision::Ignore => {}
                        Decision::IgnoreAllRemaining => self.ignore_all = true,
                        Decision::Stop => {
                            outcome.stopped_early = true;
                            stopped = true;
                        }
                    }

                    outcomes.push(outcome);
                    if stopped {
                        break;
                    }
                    continue;
                }
            };

            let script = Script::new(source, raw_text);
            let units = segment(&script.raw_text);
            tracing::debug!(script = %script.display_name, units = units.len(), "script segmented");

            for unit in units {
                if self.shared.is_cancelled() {
                    outcome.stopped_early = true;
                    stopped = true;
                    break;
                }

                tracing::debug!(
                    script = %script.display_name,
                    ordinal = unit.ordinal,
                    kind = ?unit.kind,
                    "executing unit"
                );
                match session.execute_unit(&unit).await {
                    Ok(()) => {
                        self.emit(RunEvent::UnitSucceeded {
                            script_name: script.display_name.clone(),
                            unit: unit.clone(),
                        });
                        outcome.unit_results.push(UnitResult::success(unit));
                    }
                    Err(raw_error) => {
                        let error = ExecutionError::from(raw_error);
                        tracing::warn!(
                            script = %script.display_name,
                            ordinal = unit.ordinal,
                            error = %error,
                            "unit failed"
                        );
                        self.emit(RunEvent::UnitFailed {
                            script_name: script.display_name.clone(),
                            unit: Some(unit.clone()),
                            error: error.clone(),
                        });

                        let decision = self
                            .resolve_failure(
                                &script.display_name,
                                Some(unit.clone()),
                                error.to_string(),
                            )
                            .await;
                        outcome.unit_results.push(UnitResult::failed(unit, error));
                        match decision {
                            Decision::Ignore => {}
                            Decision::IgnoreAllRemaining => self.ignore_all = true,
                            Decision::Stop => {
                                outcome.stopped_early = true;
                                stopped = true;
                                break;
                            }
                        }
                    }
                }
            }

            outcomes.push(outcome);
            if stopped {
                break;
            }
        }

        RunReport::new(outcomes, stopped)
    }

    /// Obtain the decision for a failure: synthesized Ignore when the
    /// sticky flag is set, Stop when cancellation already arrived,
    /// otherwise suspend until the handle responds. This await is the
    /// run's only suspension point.
    async fn resolve_failure(
        &self,
        script_name: &str,
        failed_unit: Option<Unit>,
        error_message: String,
    ) -> Decision {
        if self.ignore_all {
            tracing::debug!(script = %script_name, "failure ignored by sticky flag");
            return Decision::Ignore;
        }

        let (sender, receiver) = oneshot::channel();
        self.shared.park_decision(sender);

        // cancel() stores its flag before draining the parked sender, so
        // checking the flag after parking closes the race window.
        if self.shared.is_cancelled() {
            self.shared.discard_decision();
            return Decision::Stop;
        }

        self.emit(RunEvent::DecisionRequired(DecisionRequest {
            script_name: script_name.to_string(),
            failed_unit,
            error_message,
        }));
        tracing::info!(script = %script_name, "awaiting decision");

        match receiver.await {
            Ok(decision) => {
                tracing::info!(script = %script_name, decision = ?decision, "decision received");
                decision
            }
            // Sender dropped without an answer: the handle is gone.
            Err(_) => Decision::Stop,
        }
    }

    fn finish(&self, summary: RunSummary) {
        // Mark before emitting so a consumer reacting to RunFinished can
        // immediately start the next run.
        self.shared.mark_finished();
        self.emit(RunEvent::RunFinished(summary));
    }

    fn emit(&self, event: RunEvent) {
        // A dropped receiver is not an error; the run winds down through
        // the cancellation flag instead.
        let _ = self.events.send(event);
    }
}
