use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::config::Config;

use super::*;

/// Records every command and answers with a scripted exit code per program argument.
#[derive(Clone, Default)]
struct RecordingRunner {
    calls: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<Vec<(String, i32)>>>,
}

impl RecordingRunner {
    fn failing_on(needle: &str, code: i32) -> Self {
        let runner = Self::default();
        runner
            .failures
            .lock()
            .unwrap()
            .push((needle.to_string(), code));
        runner
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRunner for RecordingRunner {
    async fn run(&self, command: &ToolCommand) -> Result<i32, WorkflowError> {
        let line = command.render();
        self.calls.lock().unwrap().push(line.clone());
        let code = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        Ok(code)
    }
}

/// Collects formatted log output for the current thread.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    config: Config,
    layout: ProjectLayout,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path(), "sample1");
        std::fs::create_dir_all(layout.project_dir()).unwrap();
        let config = Config::builder()
            .with_paths(|paths| {
                paths.output_dir = dir.path().to_path_buf();
                paths.ref_genome = PathBuf::from("/ref/hg19.fa");
                paths.star_genome = PathBuf::from("/ref/star");
                paths.annovar_dir = PathBuf::from("/opt/annovar");
            })
            .build()
            .unwrap();
        Self {
            _dir: dir,
            config,
            layout,
        }
    }

    fn touch(&self, suffix: &str) -> PathBuf {
        let path = self.layout.file(suffix);
        std::fs::write(&path, b"").unwrap();
        path
    }

    fn request(&self, selector: &str, mode: WorkflowMode) -> WorkflowRequest {
        WorkflowRequest {
            layout: self.layout.clone(),
            inputs: ExternalInputs::default(),
            mode,
            region: None,
            plan: StagePlan::from_selector(selector),
        }
    }
}

fn sequencer(runner: RecordingRunner, dry_run: bool) -> WorkflowSequencer<RecordingRunner> {
    WorkflowSequencer::new(StageExecutor::new(runner, dry_run))
}

#[tokio::test]
async fn single_stage_runs_only_that_stage() {
    let fixture = Fixture::new();
    fixture.touch("dedup.bam");
    let runner = RecordingRunner::default();

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("index", WorkflowMode::default()),
        )
        .await;

    assert_eq!(run.terminal, RunTerminal::Completed);
    assert_eq!(run.executed_stages(), vec![Stage::Index]);
    assert_eq!(runner.calls().len(), 1);
    assert!(runner.calls()[0].starts_with("samtools index "));
    assert_eq!(run.exit_code(), 0);
}

#[tokio::test]
async fn unknown_selector_runs_nothing() {
    let fixture = Fixture::new();
    let runner = RecordingRunner::default();

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("not_a_stage", WorkflowMode::default()),
        )
        .await;

    assert!(run.outcomes.is_empty());
    assert!(run.events.is_empty());
    assert!(runner.calls().is_empty());
    assert_eq!(run.terminal, RunTerminal::Completed);
}

#[tokio::test]
async fn missing_gatk_extension_aborts_without_launching() {
    let fixture = Fixture::new();
    fixture.touch("split.bam");
    let runner = RecordingRunner::default();
    let table = ExtensionTable::builtin().unwrap().without(ExtensionKey::Gatk);

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &table,
            &fixture.request("gatk", WorkflowMode::default()),
        )
        .await;

    assert!(runner.calls().is_empty());
    match &run.terminal {
        RunTerminal::Aborted { stage, error } => {
            assert_eq!(*stage, Stage::Gatk);
            assert!(error.contains("'gatk'"), "{error}");
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(run.exit_code(), 2);
}

#[tokio::test]
async fn non_zero_exit_is_recorded_and_run_continues() {
    let fixture = Fixture::new();
    fixture.touch("bqsr.bam");
    fixture.touch("split.bam");
    let runner = RecordingRunner::failing_on("mpileup", 1);

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("samtools,gatk", WorkflowMode::default()),
        )
        .await;

    assert_eq!(run.executed_stages(), vec![Stage::Samtools, Stage::Gatk]);
    assert_eq!(run.outcomes[0].exit_status(), Some(1));
    assert_eq!(run.outcomes[0].failed_step, Some(StepKind::Samtools));
    assert_eq!(run.outcomes[1].exit_status(), Some(0));
    assert_eq!(run.terminal, RunTerminal::Completed);
    assert_eq!(run.exit_code(), 1);
}

#[tokio::test]
async fn halt_policy_turns_failure_into_abort() {
    let fixture = Fixture::new();
    fixture.touch("bqsr.bam");
    fixture.touch("split.bam");
    let runner = RecordingRunner::failing_on("mpileup", 3);

    let run = sequencer(runner.clone(), false)
        .with_policy(FailurePolicy::continue_on_error().with_stage(Stage::Samtools, true))
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("samtools,gatk", WorkflowMode::default()),
        )
        .await;

    assert_eq!(run.executed_stages(), vec![Stage::Samtools]);
    assert!(matches!(
        run.terminal,
        RunTerminal::Aborted {
            stage: Stage::Samtools,
            ..
        }
    ));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn halted_failure_is_not_logged_as_continuing() {
    let fixture = Fixture::new();
    fixture.touch("bqsr.bam");
    let logs = LogCapture::default();
    let _guard = logs.install();

    let run = sequencer(RecordingRunner::failing_on("mpileup", 1), false)
        .with_policy(FailurePolicy::halt_on_failure())
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("samtools", WorkflowMode::default()),
        )
        .await;

    assert!(matches!(run.terminal, RunTerminal::Aborted { .. }));
    let output = logs.contents();
    assert!(output.contains("stage failed"), "{output}");
    assert!(!output.contains("continuing"), "{output}");
}

#[tokio::test]
async fn tolerated_failure_is_logged_as_continuing() {
    let fixture = Fixture::new();
    fixture.touch("bqsr.bam");
    let logs = LogCapture::default();
    let _guard = logs.install();

    let run = sequencer(RecordingRunner::failing_on("mpileup", 1), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("samtools", WorkflowMode::default()),
        )
        .await;

    assert_eq!(run.terminal, RunTerminal::Completed);
    assert!(logs.contents().contains("continuing after stage failure"));
}

#[tokio::test]
async fn missing_upstream_file_aborts_before_execution() {
    let fixture = Fixture::new();
    let runner = RecordingRunner::default();

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("duplicates", WorkflowMode::default()),
        )
        .await;

    assert!(runner.calls().is_empty());
    match &run.terminal {
        RunTerminal::Aborted { stage, error } => {
            assert_eq!(*stage, Stage::Duplicates);
            assert!(error.contains("sample1.rg.bam"), "{error}");
        }
        other => panic!("expected abort, got {other:?}"),
    }
}

fn region_request(fixture: &Fixture, sample_file: PathBuf) -> WorkflowRequest {
    WorkflowRequest {
        inputs: ExternalInputs {
            sample_file: Some(sample_file),
            ..ExternalInputs::default()
        },
        region: Some("20:30946147-31027122".to_string()),
        ..fixture.request("extract", WorkflowMode::new(true, false))
    }
}

#[tokio::test]
async fn region_extract_checks_reorder_input_before_launching() {
    let fixture = Fixture::new();
    let sample = fixture.touch("input.bam");
    let runner = RecordingRunner::default();

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &region_request(&fixture, sample),
        )
        .await;

    assert!(runner.calls().is_empty());
    match &run.terminal {
        RunTerminal::Aborted { stage, error } => {
            assert_eq!(*stage, Stage::Extract);
            assert!(error.contains("sample1.Aligned.out.sam"), "{error}");
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(run.exit_code(), 2);
}

#[tokio::test]
async fn region_extract_runs_all_steps_when_alignment_exists() {
    let fixture = Fixture::new();
    let sample = fixture.touch("input.bam");
    fixture.touch("Aligned.out.sam");
    let runner = RecordingRunner::default();

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &region_request(&fixture, sample),
        )
        .await;

    assert_eq!(run.terminal, RunTerminal::Completed);
    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].ends_with("20:30946147-31027122"));
    assert!(calls[1].contains("ReorderSam"));
    assert!(calls[2].contains("SortSam"));
}

#[tokio::test]
async fn failed_stage_outputs_do_not_satisfy_downstream_inputs() {
    let fixture = Fixture::new();
    fixture.touch("rg.bam");
    let runner = RecordingRunner::failing_on("MarkDuplicates", 1);

    let run = sequencer(runner.clone(), false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("duplicates,index", WorkflowMode::default()),
        )
        .await;

    assert_eq!(run.executed_stages(), vec![Stage::Duplicates]);
    assert!(matches!(
        run.terminal,
        RunTerminal::Aborted {
            stage: Stage::Index,
            ..
        }
    ));
}

#[tokio::test]
async fn dry_run_of_all_walks_every_stage_in_order() {
    let fixture = Fixture::new();
    let mut request = fixture.request("all", WorkflowMode::new(false, true));
    let reads = fixture.touch("r1.fq");
    request.inputs.read1 = Some(reads);
    let runner = RecordingRunner::default();

    let run = sequencer(runner.clone(), true)
        .run(&fixture.config, &ExtensionTable::builtin().unwrap(), &request)
        .await;

    assert_eq!(run.terminal, RunTerminal::Completed);
    assert_eq!(run.executed_stages(), Stage::ALL.to_vec());
    assert!(runner.calls().is_empty());
    assert!(
        run.outcomes
            .iter()
            .all(|outcome| outcome.status == StageStatus::Skipped && outcome.duration.is_none())
    );
    assert_eq!(run.exit_code(), 0);

    let executing_replace_rg = run.events.iter().find_map(|event| match event {
        WorkflowEvent::Executing {
            stage: Stage::ReplaceRg,
            input,
        } => Some(input.clone()),
        _ => None,
    });
    assert_eq!(
        executing_replace_rg,
        Some(fixture.layout.file("2pass_Aligned.out.sam"))
    );
}

#[tokio::test]
async fn state_transitions_are_recorded_in_order() {
    let fixture = Fixture::new();
    let input = fixture.touch("dedup.bam");
    let runner = RecordingRunner::default();

    let run = sequencer(runner, false)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("index", WorkflowMode::default()),
        )
        .await;

    assert_eq!(
        run.events,
        vec![
            WorkflowEvent::Pending { stage: Stage::Index },
            WorkflowEvent::Resolving { stage: Stage::Index },
            WorkflowEvent::Executing {
                stage: Stage::Index,
                input,
            },
            WorkflowEvent::Completed {
                stage: Stage::Index,
                exit_status: Some(0),
            },
        ]
    );
}

#[tokio::test]
async fn cancellation_stops_before_next_stage() {
    let fixture = Fixture::new();
    fixture.touch("dedup.bam");
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let run = sequencer(RecordingRunner::default(), false)
        .with_cancellation(cancel)
        .run(
            &fixture.config,
            &ExtensionTable::builtin().unwrap(),
            &fixture.request("index", WorkflowMode::default()),
        )
        .await;

    assert_eq!(run.terminal, RunTerminal::Cancelled { next: Stage::Index });
    assert_eq!(run.exit_code(), 130);
}

#[tokio::test]
async fn rerunning_a_stage_resolves_identical_paths() {
    let fixture = Fixture::new();
    fixture.touch("dedup.bam");
    let runner = RecordingRunner::default();
    let seq = sequencer(runner.clone(), false);
    let request = fixture.request("splitntrim", WorkflowMode::default());

    seq.run(&fixture.config, &ExtensionTable::builtin().unwrap(), &request)
        .await;
    seq.run(&fixture.config, &ExtensionTable::builtin().unwrap(), &request)
        .await;

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
}

#[test]
fn request_validation_catches_missing_inputs() {
    let fixture = Fixture::new();

    let request = fixture.request("alignment", WorkflowMode::default());
    assert!(matches!(
        request.validate(),
        Err(WorkflowError::Configuration(_))
    ));

    let request = fixture.request("extract", WorkflowMode::new(true, false));
    assert!(request.validate().is_err());

    let request = fixture.request("extract", WorkflowMode::new(false, false));
    assert!(request.validate().is_ok());
}

#[test]
fn failure_policy_overrides_default() {
    let policy = FailurePolicy::halt_on_failure().with_stage(Stage::Bamfo, false);
    assert!(policy.halts(Stage::Gatk));
    assert!(!policy.halts(Stage::Bamfo));
    assert!(!FailurePolicy::continue_on_error().halts(Stage::Gatk));
}
