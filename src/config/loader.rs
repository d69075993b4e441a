use anyhow::{Context, Result, bail};
use dirs::home_dir;
use std::{fs, path::Path, path::PathBuf};

use super::Config;
use super::builder::ConfigBuilder;
use super::constants::{CONFIG_DIR, CONFIG_FILE};
use super::environment::apply_env_overrides;
use super::types::FileConfig;
use super::validation::validate;

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        let mut path = home_dir()?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Some(path)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Layers defaults, then the config file, then environment overrides.
    /// The builder stays open so the command line can apply the last
    /// overrides before validation.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load_builder(path: Option<&Path>) -> Result<ConfigBuilder> {
        let mut builder = ConfigBuilder::new();

        match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file {} does not exist", path.display());
                }
                builder = Self::apply_file(builder, path)?;
            }
            None => {
                if let Some(default) = Self::config_path().filter(|p| p.exists()) {
                    builder = Self::apply_file(builder, &default)?;
                }
            }
        }

        apply_env_overrides(builder)
    }

    pub fn validate(&self) -> Result<()> {
        validate(self)
    }

    fn apply_file(builder: ConfigBuilder, path: &Path) -> Result<ConfigBuilder> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed reading config at {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(builder);
        }

        let file: FileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing JSON config at {}", path.display()))?;

        Ok(file.apply(builder))
    }
}

impl FileConfig {
    pub fn apply(self, builder: ConfigBuilder) -> ConfigBuilder {
        let FileConfig { paths, tools, run } = self;

        builder
            .with_paths(|settings| {
                if let Some(dir) = paths.output_dir {
                    settings.output_dir = dir;
                }
                if let Some(dir) = paths.sample_dir {
                    settings.sample_dir = dir;
                }
                if let Some(genome) = paths.ref_genome {
                    settings.ref_genome = genome;
                }
                if let Some(genome) = paths.star_genome {
                    settings.star_genome = genome;
                }
                if let Some(dir) = paths.annovar_dir {
                    settings.annovar_dir = dir;
                }
                if paths.known_sites.is_some() {
                    settings.known_sites = paths.known_sites;
                }
                if paths.extension_table.is_some() {
                    settings.extension_table = paths.extension_table;
                }
            })
            .with_tools(|settings| {
                if let Some(star) = tools.star {
                    settings.star = star;
                }
                if let Some(samtools) = tools.samtools {
                    settings.samtools = samtools;
                }
                if let Some(bcftools) = tools.bcftools {
                    settings.bcftools = bcftools;
                }
                if let Some(java) = tools.java {
                    settings.java = java;
                }
                if let Some(perl) = tools.perl {
                    settings.perl = perl;
                }
                if let Some(jar) = tools.picard_jar {
                    settings.picard_jar = jar;
                }
                if let Some(jar) = tools.gatk_jar {
                    settings.gatk_jar = jar;
                }
                if let Some(jar) = tools.bamfo_jar {
                    settings.bamfo_jar = jar;
                }
            })
            .with_run(|settings| {
                if let Some(cpus) = run.num_cpus {
                    settings.num_cpus = cpus;
                }
                if let Some(overhang) = run.sjdb_overhang {
                    settings.sjdb_overhang = overhang;
                }
                if let Some(build) = run.genome_build {
                    settings.genome_build = build;
                }
                if let Some(table) = run.dbsnp_table {
                    settings.dbsnp_table = table;
                }
                if let Some(halt) = run.halt_on_failure {
                    settings.halt_on_failure = halt;
                }
                if let Some(stages) = run.halt_stages {
                    settings.halt_stages = stages;
                }
            })
    }
}
