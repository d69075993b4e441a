use std::time::Duration;

use serde::Serialize;

use super::commands::StepKind;
use super::types::Stage;

/// How a stage ended once the executor returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageStatus {
    Exited { code: i32 },
    /// Dry-run: commands were logged, nothing was launched.
    Skipped,
}

/// Result of one stage execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    pub duration: Option<Duration>,
    pub commands: Vec<String>,
    /// Step that returned the non-zero exit, if any.
    pub failed_step: Option<StepKind>,
}

impl StageOutcome {
    pub fn exit_status(&self) -> Option<i32> {
        match self.status {
            StageStatus::Exited { code } => Some(code),
            StageStatus::Skipped => None,
        }
    }

    /// Zero exit or dry-run skip.
    pub fn is_success(&self) -> bool {
        self.exit_status().is_none_or(|code| code == 0)
    }
}

/// How the run as a whole ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunTerminal {
    Completed,
    Aborted { stage: Stage, error: String },
    Cancelled { next: Stage },
}
