use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, warn};

use crate::config::{Config, ConfigBuilder};
use crate::exec::ShellRunner;
use crate::logging;
use crate::workflow::{
    CancellationFlag, ExtensionTable, ExternalInputs, FailurePolicy, PathResolver, ProjectLayout,
    Stage, StageExecutor, StagePlan, WorkflowError, WorkflowMode, WorkflowRequest,
    WorkflowSequencer,
};

use super::args::{Cli, Command, RunArgs};
use super::report;

pub(crate) async fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Some(Command::Stages) => {
            list_stages();
            Ok(0)
        }
        Some(Command::Paths) => show_paths(&cli.run).map(|()| 0),
        None => run_workflow(&cli.run).await,
    };

    match result {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn list_stages() {
    for (idx, stage) in Stage::ALL.iter().enumerate() {
        println!("{:>2}. {stage}", idx + 1);
    }
}

async fn run_workflow(args: &RunArgs) -> Result<i32> {
    let config = load_config(args)?;
    let table = load_extension_table(&config)?;
    let request = build_request(args, &config)?;
    request.validate()?;

    let project_dir = request.layout.project_dir();
    fs::create_dir_all(&project_dir)
        .with_context(|| format!("Unable to create project directory {}", project_dir.display()))?;
    if request.mode.two_pass {
        let genome_dir = request.layout.two_pass_genome_dir();
        fs::create_dir_all(&genome_dir).with_context(|| {
            format!("Unable to create two-pass genome directory {}", genome_dir.display())
        })?;
    }

    logging::init(args.verbose, Some(&request.layout.log_file()))?;

    let unknown = StagePlan::unknown_tokens(&args.stage);
    if !unknown.is_empty() {
        warn!(tokens = ?unknown, "selector tokens name no stage");
    }
    if request.plan.is_empty() {
        warn!(selector = %args.stage, "stage selector matches no stage; nothing to run");
    }

    let cancel = CancellationFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current stage");
            on_signal.cancel();
        }
    });

    let sequencer = WorkflowSequencer::new(StageExecutor::new(ShellRunner, config.run.dry_run))
        .with_policy(failure_policy(&config)?)
        .with_cancellation(cancel);
    let run = sequencer.run(&config, &table, &request).await;

    report::print_summary(&run);
    report::write_report(&request.layout, &run)?;

    Ok(run.exit_code())
}

fn show_paths(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let table = load_extension_table(&config)?;
    let request = build_request(args, &config)?;
    let resolver = PathResolver::new(&request.layout, &table, &request.inputs, request.mode);

    for stage in Stage::ALL {
        match resolver.resolve_input(stage) {
            Ok(path) => println!("{:<18} {}", stage.name(), path.display()),
            Err(err) => println!("{:<18} <{err}>", stage.name()),
        }
    }
    Ok(())
}

fn load_config(args: &RunArgs) -> Result<Config> {
    let builder = Config::load_builder(args.config.as_deref())?;
    let config = apply_cli_overrides(builder, args).build()?;
    config.validate()?;
    Ok(config)
}

fn apply_cli_overrides(builder: ConfigBuilder, args: &RunArgs) -> ConfigBuilder {
    builder
        .with_paths(|paths| {
            if let Some(dir) = &args.output_dir {
                paths.output_dir = dir.clone();
            }
            if let Some(dir) = &args.sample_dir {
                paths.sample_dir = dir.clone();
            }
            if let Some(genome) = &args.ref_genome {
                paths.ref_genome = genome.clone();
            }
            if let Some(genome) = &args.star_genome {
                paths.star_genome = genome.clone();
            }
            if let Some(dir) = &args.annovar {
                paths.annovar_dir = dir.clone();
            }
            if let Some(sites) = &args.known_sites {
                paths.known_sites = Some(sites.clone());
            }
            if let Some(table) = &args.extensions {
                paths.extension_table = Some(table.clone());
            }
        })
        .with_run(|run| {
            if let Some(cpus) = args.num_cpus {
                run.num_cpus = cpus;
            }
            if args.halt_on_failure {
                run.halt_on_failure = true;
            }
            run.dry_run = args.debug;
        })
}

fn load_extension_table(config: &Config) -> Result<ExtensionTable> {
    let table = match &config.paths.extension_table {
        Some(path) => ExtensionTable::load(path)?,
        None => ExtensionTable::builtin().context("Built-in extension table is malformed")?,
    };
    debug!(entries = table.len(), "extension table loaded");
    Ok(table)
}

fn build_request(args: &RunArgs, config: &Config) -> Result<WorkflowRequest> {
    let project = args
        .project_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| WorkflowError::Configuration("--project-name is required".into()))?;

    let sample_dir = &config.paths.sample_dir;
    let inputs = ExternalInputs {
        read1: args.read1.as_deref().map(|p| in_dir(sample_dir, p)),
        read2: args.read2.as_deref().map(|p| in_dir(sample_dir, p)),
        sample_file: args.sample_file.as_deref().map(|p| in_dir(sample_dir, p)),
    };

    Ok(WorkflowRequest {
        layout: ProjectLayout::new(&config.paths.output_dir, project),
        inputs,
        mode: WorkflowMode::new(args.region.is_some(), args.star2pass),
        region: args.region.clone(),
        plan: StagePlan::from_selector(&args.stage),
    })
}

fn failure_policy(config: &Config) -> Result<FailurePolicy> {
    let mut policy = if config.run.halt_on_failure {
        FailurePolicy::halt_on_failure()
    } else {
        FailurePolicy::continue_on_error()
    };
    for name in &config.run.halt_stages {
        policy = policy.with_stage(name.parse::<Stage>()?, true);
    }
    Ok(policy)
}

fn in_dir(dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        dir.join(path)
    } else {
        path.to_path_buf()
    }
}
