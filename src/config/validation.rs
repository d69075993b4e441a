use anyhow::Result;

use crate::workflow::{Stage, WorkflowError};

use super::types::Config;

/// Startup checks that must pass before any stage runs.
pub fn validate(config: &Config) -> Result<()> {
    let required = [
        ("reference genome", &config.paths.ref_genome),
        ("STAR genome directory", &config.paths.star_genome),
        ("ANNOVAR directory", &config.paths.annovar_dir),
    ];
    for (label, path) in required {
        if path.as_os_str().is_empty() {
            return Err(WorkflowError::Configuration(format!(
                "{label} is not set and no home directory is available for the default"
            ))
            .into());
        }
    }

    if config.run.num_cpus == 0 {
        return Err(
            WorkflowError::Configuration("num_cpus must be greater than zero".into()).into(),
        );
    }

    for name in &config.run.halt_stages {
        name.parse::<Stage>()?;
    }

    Ok(())
}
