use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::outcome::{RunTerminal, StageOutcome};
use super::types::{Stage, StagePlan, WorkflowMode};

/// State of one stage in the sequencer, in transition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Pending { stage: Stage },
    Resolving { stage: Stage },
    Executing { stage: Stage, input: PathBuf },
    Completed { stage: Stage, exit_status: Option<i32> },
    Aborted { stage: Stage, error: String },
    Cancelled { next: Stage },
}

/// Mutable state threaded through one run of the sequencer.
#[derive(Debug)]
pub struct WorkflowContext {
    pub mode: WorkflowMode,
    pub plan: StagePlan,
    produced: HashSet<PathBuf>,
    outcomes: Vec<StageOutcome>,
    events: Vec<WorkflowEvent>,
}

impl WorkflowContext {
    pub fn new(mode: WorkflowMode, plan: StagePlan) -> Self {
        Self {
            mode,
            plan,
            produced: HashSet::new(),
            outcomes: Vec::new(),
            events: Vec::new(),
        }
    }

    /// True when `path` is on disk or was declared as an output earlier in this run.
    pub fn is_available(&self, path: &Path) -> bool {
        self.produced.contains(path) || path.exists()
    }

    pub fn record_produced<'p>(&mut self, paths: impl IntoIterator<Item = &'p PathBuf>) {
        self.produced.extend(paths.into_iter().cloned());
    }

    pub fn record_pending(&mut self, stage: Stage) {
        debug!(%stage, state = "pending");
        self.events.push(WorkflowEvent::Pending { stage });
    }

    pub fn record_resolving(&mut self, stage: Stage) {
        debug!(%stage, state = "resolving");
        self.events.push(WorkflowEvent::Resolving { stage });
    }

    pub fn record_executing(&mut self, stage: Stage, input: &Path) {
        info!(%stage, state = "executing", path = %input.display(), "stage started");
        self.events.push(WorkflowEvent::Executing {
            stage,
            input: input.to_path_buf(),
        });
    }

    pub fn record_outcome(&mut self, outcome: StageOutcome) {
        let stage = outcome.stage;
        let exit_status = outcome.exit_status();
        let duration_ms = outcome.duration.map(|d| d.as_millis() as u64);
        if outcome.is_success() {
            info!(%stage, state = "completed", exit_code = ?exit_status, duration_ms = ?duration_ms, "stage finished");
        } else {
            warn!(%stage, state = "completed", exit_code = ?exit_status, duration_ms = ?duration_ms, "stage failed");
        }
        self.events.push(WorkflowEvent::Completed { stage, exit_status });
        self.outcomes.push(outcome);
    }

    pub fn record_abort(&mut self, stage: Stage, message: impl Into<String>) {
        let message = message.into();
        error!(%stage, state = "aborted", error = %message, "run aborted");
        self.events.push(WorkflowEvent::Aborted {
            stage,
            error: message,
        });
    }

    pub fn record_cancel(&mut self, next: Stage) {
        warn!(next = %next, state = "cancelled", "run cancelled before stage");
        self.events.push(WorkflowEvent::Cancelled { next });
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn into_run(self, terminal: RunTerminal) -> WorkflowRun {
        let WorkflowContext {
            mode,
            plan,
            outcomes,
            events,
            ..
        } = self;
        WorkflowRun {
            mode,
            plan,
            outcomes,
            events,
            terminal,
        }
    }
}

/// Everything a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    pub mode: WorkflowMode,
    pub plan: StagePlan,
    pub outcomes: Vec<StageOutcome>,
    pub events: Vec<WorkflowEvent>,
    pub terminal: RunTerminal,
}

impl WorkflowRun {
    pub fn executed_stages(&self) -> Vec<Stage> {
        self.outcomes.iter().map(|outcome| outcome.stage).collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = &StageOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    /// `0` clean, `1` some stage exited non-zero, `2` aborted, `130` cancelled.
    pub fn exit_code(&self) -> i32 {
        match self.terminal {
            RunTerminal::Aborted { .. } => 2,
            RunTerminal::Cancelled { .. } => 130,
            RunTerminal::Completed if self.failed().next().is_some() => 1,
            RunTerminal::Completed => 0,
        }
    }
}
