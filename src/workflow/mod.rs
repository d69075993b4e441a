//! Stage sequencing and file-naming engine for the variant-calling workflow.

pub mod commands;
pub mod context;
pub mod error;
pub mod executor;
pub mod extensions;
pub mod outcome;
pub mod resolver;
pub mod sequencer;
pub mod types;

pub use commands::{StepKind, ToolCommand};
#[allow(unused_imports)]
pub use context::{WorkflowEvent, WorkflowRun};
pub use error::WorkflowError;
pub use executor::{StageExecutor, ToolRunner};
#[allow(unused_imports)]
pub use extensions::{ExtensionKey, ExtensionTable};
pub use outcome::{RunTerminal, StageOutcome, StageStatus};
pub use resolver::{ExternalInputs, PathResolver, ProjectLayout};
pub use sequencer::{CancellationFlag, FailurePolicy, WorkflowRequest, WorkflowSequencer};
pub use types::{Stage, StagePlan, WorkflowMode};

#[cfg(test)]
mod tests;
