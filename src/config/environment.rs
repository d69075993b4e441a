use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;

use super::builder::ConfigBuilder;

pub fn apply_env_overrides(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Some(dir) = env_path("RNAVAR_OUTPUT_DIR")? {
        builder = builder.with_paths(|paths| paths.output_dir = dir);
    }

    if let Some(dir) = env_path("RNAVAR_SAMPLE_DIR")? {
        builder = builder.with_paths(|paths| paths.sample_dir = dir);
    }

    if let Some(genome) = env_path("RNAVAR_REF_GENOME")? {
        builder = builder.with_paths(|paths| paths.ref_genome = genome);
    }

    if let Some(genome) = env_path("RNAVAR_STAR_GENOME")? {
        builder = builder.with_paths(|paths| paths.star_genome = genome);
    }

    if let Some(dir) = env_path("RNAVAR_ANNOVAR_DIR")? {
        builder = builder.with_paths(|paths| paths.annovar_dir = dir);
    }

    if let Some(table) = env_path("RNAVAR_EXTENSION_TABLE")? {
        builder = builder.with_paths(|paths| paths.extension_table = Some(table));
    }

    if let Some(jar) = env_path("RNAVAR_PICARD_JAR")? {
        builder = builder.with_tools(|tools| tools.picard_jar = jar);
    }

    if let Some(jar) = env_path("RNAVAR_GATK_JAR")? {
        builder = builder.with_tools(|tools| tools.gatk_jar = jar);
    }

    if let Some(cpus) = env_u32("RNAVAR_NUM_CPUS")? {
        builder = builder.with_run(|run| run.num_cpus = cpus);
    }

    if let Some(halt) = env_bool("RNAVAR_HALT_ON_FAILURE")? {
        builder = builder.with_run(|run| run.halt_on_failure = halt);
    }

    Ok(builder)
}

pub fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(anyhow!("{key} contains invalid UTF-8")),
    }
}

pub fn env_path(key: &str) -> Result<Option<PathBuf>> {
    Ok(env_string(key)?
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from))
}

pub fn env_u32(key: &str) -> Result<Option<u32>> {
    if let Some(value) = env_string(key)? {
        let parsed = value
            .parse::<u32>()
            .with_context(|| format!("Failed to parse {key} as u32"))?;
        Ok(Some(parsed))
    } else {
        Ok(None)
    }
}

pub fn env_bool(key: &str) -> Result<Option<bool>> {
    match env_string(key)?.as_deref().map(str::trim) {
        None => Ok(None),
        Some("1" | "true" | "yes") => Ok(Some(true)),
        Some("0" | "false" | "no") => Ok(Some(false)),
        Some(other) => Err(anyhow!("Failed to parse {key} value '{other}' as a boolean")),
    }
}
