use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::fs;
use std::time::Duration;

use crate::workflow::{
    ProjectLayout, RunTerminal, StageOutcome, StageStatus, StepKind, WorkflowRun,
};

#[derive(Serialize)]
struct RunReport<'a> {
    project: &'a str,
    exit_code: i32,
    #[serde(flatten)]
    run: &'a WorkflowRun,
}

pub(crate) fn print_summary(run: &WorkflowRun) {
    println!("\n{}", "=== Workflow Summary ===".bold());

    if run.outcomes.is_empty() {
        println!("  no stages executed");
    }
    for outcome in &run.outcomes {
        println!("  {:<18} {}", outcome.stage.name(), status_label(outcome));
    }

    let terminal = match &run.terminal {
        RunTerminal::Completed if run.exit_code() == 0 => "completed".green().bold(),
        RunTerminal::Completed => "completed with failures".yellow().bold(),
        RunTerminal::Aborted { stage, error } => {
            format!("aborted at {stage}: {error}").as_str().red().bold()
        }
        RunTerminal::Cancelled { next } => {
            format!("cancelled before {next}").as_str().yellow().bold()
        }
    };
    println!("\n{terminal}");
}

fn status_label(outcome: &StageOutcome) -> ColoredString {
    match outcome.status {
        StageStatus::Skipped => "skipped (dry-run)".yellow(),
        StageStatus::Exited { code: 0 } => {
            format!("ok{}", format_duration(outcome.duration)).as_str().green()
        }
        StageStatus::Exited { code } => {
            let step = outcome.failed_step.map(StepKind::name).unwrap_or("tool");
            format!("{step} exited {code}{}", format_duration(outcome.duration))
                .as_str()
                .red()
        }
    }
}

fn format_duration(duration: Option<Duration>) -> String {
    duration
        .map(|d| format!(" ({:.1}s)", d.as_secs_f64()))
        .unwrap_or_default()
}

pub(crate) fn write_report(layout: &ProjectLayout, run: &WorkflowRun) -> Result<()> {
    let path = layout.report_file();
    let report = RunReport {
        project: layout.project(),
        exit_code: run.exit_code(),
        run,
    };
    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize run report to JSON")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write run report to {}", path.display()))?;
    Ok(())
}
