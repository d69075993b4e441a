use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use super::commands;

/// Entry point for the `rnavar` command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "rnavar",
    about = "RNA-seq variant calling workflow driver",
    version,
    long_about = None
)]
pub struct Cli {
    /// Optional subcommand; without one the workflow runs.
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the workflow stages in execution order.
    Stages,
    /// Print the input path every stage would read, without running anything.
    Paths,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Stage selector: `all`, a stage name, or a comma separated list of names
    #[arg(long, default_value = "all")]
    pub stage: String,

    /// Name of the project; files are written to <output-dir>/<project-name>/
    #[arg(long)]
    pub project_name: Option<String>,

    /// Forward read for alignment
    #[arg(long)]
    pub read1: Option<PathBuf>,

    /// Reverse read for paired alignment
    #[arg(long)]
    pub read2: Option<PathBuf>,

    /// Directory relative read and sample paths are resolved against
    #[arg(long)]
    pub sample_dir: Option<PathBuf>,

    /// Output directory (defaults to the current directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// STAR genome directory
    #[arg(long)]
    pub star_genome: Option<PathBuf>,

    /// Reference genome FASTA
    #[arg(long)]
    pub ref_genome: Option<PathBuf>,

    /// Perform STAR two-pass alignment
    #[arg(long)]
    pub star2pass: bool,

    /// Alignment file used for region-specific calling
    #[arg(long)]
    pub sample_file: Option<PathBuf>,

    /// Region for region-specific calling, e.g. 20:30946147-31027122
    #[arg(long)]
    pub region: Option<String>,

    /// Number of threads handed to the tools
    #[arg(long)]
    pub num_cpus: Option<u32>,

    /// ANNOVAR installation directory (scripts plus humandb/)
    #[arg(long)]
    pub annovar: Option<PathBuf>,

    /// Known variant sites for base quality recalibration
    #[arg(long)]
    pub known_sites: Option<PathBuf>,

    /// Extension table replacing the built-in one
    #[arg(long)]
    pub extensions: Option<PathBuf>,

    /// Config file (defaults to ~/.rnavar/config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log commands without executing them
    #[arg(long, visible_alias = "dry-run")]
    pub debug: bool,

    /// Stop the run at the first stage that exits non-zero
    #[arg(long)]
    pub halt_on_failure: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(self) -> ExitCode {
        commands::run(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_all_stages() {
        let cli = Cli::try_parse_from(["rnavar", "--project-name", "s1"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.stage, "all");
        assert_eq!(cli.run.project_name.as_deref(), Some("s1"));
        assert!(!cli.run.star2pass);
        assert!(!cli.run.debug);
    }

    #[test]
    fn dry_run_alias_sets_debug() {
        let cli = Cli::try_parse_from(["rnavar", "--dry-run", "--stage", "gatk"]).unwrap();
        assert!(cli.run.debug);
        assert_eq!(cli.run.stage, "gatk");
    }

    #[test]
    fn paths_subcommand_takes_run_flags() {
        let cli = Cli::try_parse_from([
            "rnavar",
            "--project-name",
            "s1",
            "--region",
            "20:1-100",
            "--star2pass",
            "paths",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Paths)));
        assert_eq!(cli.run.region.as_deref(), Some("20:1-100"));
        assert!(cli.run.star2pass);
    }
}
