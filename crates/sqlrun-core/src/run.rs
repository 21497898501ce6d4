//! Run results and the decision protocol

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ExecutionError, ScriptSource, Unit};

/// Outcome of executing one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOutcome {
    Success,
    Failed(ExecutionError),
}

/// Result of one unit's execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitResult {
    pub unit: Unit,
    pub outcome: UnitOutcome,
}

impl UnitResult {
    /// Create a successful unit result
    pub fn success(unit: Unit) -> Self {
        Self {
            unit,
            outcome: UnitOutcome::Success,
        }
    }

    /// Create a failed unit result
    pub fn failed(unit: Unit, error: ExecutionError) -> Self {
        Self {
            unit,
            outcome: UnitOutcome::Failed(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&ExecutionError> {
        match &self.outcome {
            UnitOutcome::Failed(error) => Some(error),
            UnitOutcome::Success => None,
        }
    }
}

/// Accumulated results for one script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOutcome {
    pub script_name: String,
    pub path: PathBuf,
    /// Results in execution order; empty when the file could not be read.
    pub unit_results: Vec<UnitResult>,
    /// Set when the script file could not be read; no units were attempted.
    pub read_error: Option<String>,
    /// True when a Stop decision abandoned the rest of this script.
    pub stopped_early: bool,
}

impl ScriptOutcome {
    pub fn new(source: &ScriptSource) -> Self {
        Self {
            script_name: source.display_name.clone(),
            path: source.path.clone(),
            unit_results: Vec::new(),
            read_error: None,
            stopped_early: false,
        }
    }

    pub fn success_count(&self) -> usize {
        self.unit_results.iter().filter(|r| r.is_success()).count()
    }

    /// Failed units, plus one for a file that could not be read.
    pub fn failure_count(&self) -> usize {
        let failed_units = self.unit_results.iter().filter(|r| r.is_failed()).count();
        failed_units + usize::from(self.read_error.is_some())
    }
}

/// Final tallies for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub success_count: usize,
    pub error_count: usize,
    /// True only when the run ended through a Stop decision or `cancel`.
    pub stopped: bool,
}

impl RunSummary {
    pub fn empty() -> Self {
        Self {
            success_count: 0,
            error_count: 0,
            stopped: false,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// One entry per started script, in execution order. Scripts the run
    /// never reached contribute nothing.
    pub outcomes: Vec<ScriptOutcome>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Build a report, deriving the tallies from the outcomes.
    pub fn new(outcomes: Vec<ScriptOutcome>, stopped: bool) -> Self {
        let success_count = outcomes.iter().map(|o| o.success_count()).sum();
        let error_count = outcomes.iter().map(|o| o.failure_count()).sum();
        Self {
            outcomes,
            summary: RunSummary {
                success_count,
                error_count,
                stopped,
            },
        }
    }
}

/// Reply to a [`DecisionRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Skip the failed unit and continue with the next one.
    Ignore,
    /// Skip it and suppress prompts for the rest of the run, all scripts
    /// included.
    IgnoreAllRemaining,
    /// Abandon everything that has not run yet.
    Stop,
}

/// Raised when a unit fails and the run suspends for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub script_name: String,
    /// The failed unit; `None` when the script file itself could not be
    /// read.
    pub failed_unit: Option<Unit>,
    pub error_message: String,
}
