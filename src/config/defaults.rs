use std::env;
use std::path::PathBuf;

use dirs::home_dir;

use super::constants::*;
use super::types::{PathSettings, RunSettings, ToolSettings};

/// `$HOME/<parts...>`, or an empty path when no home directory resolves.
/// Validation rejects empty paths, so the missing home surfaces at startup.
pub fn home_relative(parts: &[&str]) -> PathBuf {
    match home_dir() {
        Some(mut path) => {
            path.extend(parts);
            path
        }
        None => PathBuf::new(),
    }
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_dir: current_dir(),
            sample_dir: current_dir(),
            ref_genome: home_relative(&["ref_genome"]),
            star_genome: home_relative(&["star_genome"]),
            annovar_dir: home_relative(&["src", "annovar"]),
            known_sites: None,
            extension_table: None,
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            star: "STAR".to_string(),
            samtools: "samtools".to_string(),
            bcftools: "bcftools".to_string(),
            java: "java".to_string(),
            perl: "perl".to_string(),
            picard_jar: PathBuf::from(DEFAULT_PICARD_JAR),
            gatk_jar: PathBuf::from(DEFAULT_GATK_JAR),
            bamfo_jar: PathBuf::from(DEFAULT_BAMFO_JAR),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            num_cpus: DEFAULT_NUM_CPUS,
            sjdb_overhang: DEFAULT_SJDB_OVERHANG,
            genome_build: DEFAULT_GENOME_BUILD.to_string(),
            dbsnp_table: DEFAULT_DBSNP_TABLE.to_string(),
            halt_on_failure: false,
            halt_stages: Vec::new(),
            dry_run: false,
        }
    }
}
