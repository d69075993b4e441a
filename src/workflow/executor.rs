use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use super::commands::{StageInvocation, ToolCommand};
use super::error::WorkflowError;
use super::outcome::{StageOutcome, StageStatus};

/// Runs one external command to completion and reports its exit code.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand) -> Result<i32, WorkflowError>;
}

/// Executes the tool steps of a stage, one process at a time.
pub struct StageExecutor<R> {
    runner: R,
    dry_run: bool,
}

impl<R: ToolRunner> StageExecutor<R> {
    pub fn new(runner: R, dry_run: bool) -> Self {
        Self { runner, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Steps after the first non-zero exit are not attempted; their inputs
    /// would be missing.
    pub async fn execute(&self, invocation: &StageInvocation) -> Result<StageOutcome, WorkflowError> {
        let stage = invocation.stage;
        let commands: Vec<String> = invocation
            .steps
            .iter()
            .map(|step| step.command.render())
            .collect();

        if self.dry_run {
            for (step, line) in invocation.steps.iter().zip(&commands) {
                info!(%stage, step = %step.kind, command = %line, "dry-run: {}", step.message());
            }
            return Ok(StageOutcome {
                stage,
                status: StageStatus::Skipped,
                duration: None,
                commands,
                failed_step: None,
            });
        }

        let started = Instant::now();
        let mut code = 0;
        let mut failed_step = None;

        for (step, line) in invocation.steps.iter().zip(&commands) {
            info!(%stage, step = %step.kind, command = %line, "{}", step.message());
            code = self.runner.run(&step.command).await?;
            if code != 0 {
                warn!(%stage, step = %step.kind, exit_code = code, "tool exited with non-zero status");
                failed_step = Some(step.kind);
                break;
            }
        }

        Ok(StageOutcome {
            stage,
            status: StageStatus::Exited { code },
            duration: Some(started.elapsed()),
            commands,
            failed_step,
        })
    }
}
