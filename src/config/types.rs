use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: PathSettings,
    pub tools: ToolSettings,
    pub run: RunSettings,
}

/// Directories and reference data the workflow reads from or writes into.
#[derive(Debug, Clone)]
pub struct PathSettings {
    pub output_dir: PathBuf,
    pub sample_dir: PathBuf,
    pub ref_genome: PathBuf,
    pub star_genome: PathBuf,
    pub annovar_dir: PathBuf,
    pub known_sites: Option<PathBuf>,
    pub extension_table: Option<PathBuf>,
}

/// Executables and jars invoked by the stages.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub star: String,
    pub samtools: String,
    pub bcftools: String,
    pub java: String,
    pub perl: String,
    pub picard_jar: PathBuf,
    pub gatk_jar: PathBuf,
    pub bamfo_jar: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub num_cpus: u32,
    pub sjdb_overhang: u32,
    pub genome_build: String,
    pub dbsnp_table: String,
    pub halt_on_failure: bool,
    pub halt_stages: Vec<String>,
    pub dry_run: bool,
}

// File configuration types
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub paths: FilePathSettings,
    pub tools: FileToolSettings,
    pub run: FileRunSettings,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(super) struct FilePathSettings {
    pub output_dir: Option<PathBuf>,
    pub sample_dir: Option<PathBuf>,
    pub ref_genome: Option<PathBuf>,
    pub star_genome: Option<PathBuf>,
    pub annovar_dir: Option<PathBuf>,
    pub known_sites: Option<PathBuf>,
    pub extension_table: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(super) struct FileToolSettings {
    pub star: Option<String>,
    pub samtools: Option<String>,
    pub bcftools: Option<String>,
    pub java: Option<String>,
    pub perl: Option<String>,
    pub picard_jar: Option<PathBuf>,
    pub gatk_jar: Option<PathBuf>,
    pub bamfo_jar: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(super) struct FileRunSettings {
    pub num_cpus: Option<u32>,
    pub sjdb_overhang: Option<u32>,
    pub genome_build: Option<String>,
    pub dbsnp_table: Option<String>,
    pub halt_on_failure: Option<bool>,
    pub halt_stages: Option<Vec<String>>,
}
