use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::config::Config;

use super::commands::StageCommands;
use super::context::{WorkflowContext, WorkflowRun};
use super::error::WorkflowError;
use super::executor::{StageExecutor, ToolRunner};
use super::extensions::ExtensionTable;
use super::outcome::RunTerminal;
use super::resolver::{ExternalInputs, PathResolver, ProjectLayout};
use super::types::{Stage, StagePlan, WorkflowMode};

/// Immutable description of one run, assembled once at startup.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub layout: ProjectLayout,
    pub inputs: ExternalInputs,
    pub mode: WorkflowMode,
    pub region: Option<String>,
    pub plan: StagePlan,
}

impl WorkflowRequest {
    /// Checks that do not need the filesystem; run before any stage starts.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.layout.project().trim().is_empty() {
            return Err(WorkflowError::Configuration("project name is required".into()));
        }
        if self.plan.contains(Stage::Alignment) && self.inputs.read1.is_none() {
            return Err(WorkflowError::Configuration(
                "stage alignment requires --read1".into(),
            ));
        }
        if self.mode.region_specific
            && self.plan.contains(Stage::Extract)
            && self.inputs.sample_file.is_none()
        {
            return Err(WorkflowError::Configuration(
                "region-specific extract requires --sample-file".into(),
            ));
        }
        Ok(())
    }
}

/// Whether a non-zero stage exit stops the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePolicy {
    halt_on_failure: bool,
    overrides: HashMap<Stage, bool>,
}

impl FailurePolicy {
    pub fn continue_on_error() -> Self {
        Self::default()
    }

    pub fn halt_on_failure() -> Self {
        Self {
            halt_on_failure: true,
            overrides: HashMap::new(),
        }
    }

    pub fn with_stage(mut self, stage: Stage, halt: bool) -> Self {
        self.overrides.insert(stage, halt);
        self
    }

    pub fn halts(&self, stage: Stage) -> bool {
        self.overrides
            .get(&stage)
            .copied()
            .unwrap_or(self.halt_on_failure)
    }
}

/// Shared flag set from a signal handler; checked between stages.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Walks the fixed stage order once, resolving and executing selected stages.
pub struct WorkflowSequencer<R> {
    executor: StageExecutor<R>,
    policy: FailurePolicy,
    cancel: CancellationFlag,
}

impl<R: ToolRunner> WorkflowSequencer<R> {
    pub fn new(executor: StageExecutor<R>) -> Self {
        Self {
            executor,
            policy: FailurePolicy::default(),
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(
        &self,
        config: &Config,
        table: &ExtensionTable,
        request: &WorkflowRequest,
    ) -> WorkflowRun {
        let mut context = WorkflowContext::new(request.mode, request.plan.clone());
        let resolver = PathResolver::new(&request.layout, table, &request.inputs, request.mode);
        let commands = StageCommands::new(resolver, config, request.region.as_deref());

        info!(
            project = request.layout.project(),
            region_specific = request.mode.region_specific,
            two_pass = request.mode.two_pass,
            dry_run = self.executor.is_dry_run(),
            stages = request.plan.stages().len(),
            "workflow started"
        );

        for stage in Stage::ALL {
            if !request.plan.contains(stage) {
                continue;
            }
            if self.cancel.is_cancelled() {
                context.record_cancel(stage);
                return context.into_run(RunTerminal::Cancelled { next: stage });
            }

            context.record_pending(stage);
            context.record_resolving(stage);

            let invocation = match commands.invocation(stage) {
                Ok(invocation) => invocation,
                Err(error) => return abort(context, stage, error),
            };

            if let Some(missing) = invocation
                .required()
                .into_iter()
                .find(|path| !context.is_available(path))
            {
                let error = WorkflowError::MissingUpstreamFile {
                    stage,
                    path: missing,
                };
                return abort(context, stage, error);
            }

            context.record_executing(stage, &invocation.input);
            let outcome = match self.executor.execute(&invocation).await {
                Ok(outcome) => outcome,
                Err(error) => return abort(context, stage, error),
            };

            for path in &invocation.handoff {
                info!(%stage, path = %path.display(), "output handed off for downstream parsing");
            }

            let failed_code = outcome.exit_status().filter(|code| *code != 0);
            if outcome.is_success() {
                context.record_produced(invocation.outputs());
            }
            context.record_outcome(outcome);

            if let Some(code) = failed_code {
                if self.policy.halts(stage) {
                    return abort(context, stage, WorkflowError::ToolExecution { stage, code });
                }
                warn!(%stage, exit_code = code, "continuing after stage failure");
            }
        }

        info!(stages = context.outcomes().len(), "workflow finished");
        context.into_run(RunTerminal::Completed)
    }
}

fn abort(mut context: WorkflowContext, stage: Stage, error: WorkflowError) -> WorkflowRun {
    let message = error.to_string();
    context.record_abort(stage, &message);
    context.into_run(RunTerminal::Aborted {
        stage,
        error: message,
    })
}
