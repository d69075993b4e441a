use std::path::PathBuf;

use thiserror::Error;

use super::types::Stage;

/// Failures raised by the workflow engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("no file extension registered for '{key}'")]
    UnknownExtension { key: String },

    #[error("stage {stage}: expected input {} does not exist", .path.display())]
    MissingUpstreamFile { stage: Stage, path: PathBuf },

    #[error("stage {stage}: tool exited with status {code}")]
    ToolExecution { stage: Stage, code: i32 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("extension table line {line}: expected `key value`, found '{content}'")]
    ExtensionTableParse { line: usize, content: String },

    #[error("failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
