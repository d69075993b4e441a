//! Pure derivation of stage input and output paths.
//!
//! Every path is `<output_dir>/<project>/<project>.<chain>` where the chain is
//! built from extension-table lookups and a few literal infixes. Nothing here
//! touches the filesystem, so resolving twice always yields the same path.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::WorkflowError;
use super::extensions::{ExtensionKey, ExtensionTable};
use super::types::{Stage, WorkflowMode};

use ExtensionKey as K;
use Token::{Ext, Literal};

/// Literal token ANNOVAR input files carry after the `annotation` extension.
pub const ANNOVAR_INFIX: &str = "annovar";
/// Prefix infix used by the second STAR pass.
pub const TWO_PASS_PREFIX: &str = "2pass_";
/// Genome directory regenerated between the two STAR passes.
pub const TWO_PASS_GENOME_DIR: &str = "star_2pass";

/// One element of an extension chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Ext(ExtensionKey),
    Literal(&'static str),
}

/// Where a stage reads its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// A file inside the project directory named by an extension chain.
    Chain(&'static [Token]),
    /// The caller-supplied BAM used for region-specific calling.
    SampleFile,
    /// The caller-supplied forward read.
    Read1,
}

const ALIGNMENT_INDEX: &[Token] = &[Ext(K::AlignmentIndex)];
const EXTRACT: &[Token] = &[Ext(K::Extract)];
const STAR_ALIGNMENT: &[Token] = &[Ext(K::StarAlignment)];
const STAR2PASS: &[Token] = &[Ext(K::Star2Pass)];
const SORT: &[Token] = &[Ext(K::Sort)];
const REORDER: &[Token] = &[Ext(K::Reorder)];
const REPLACE_RG: &[Token] = &[Ext(K::ReplaceRg)];
const DUPLICATES: &[Token] = &[Ext(K::Duplicates)];
const SPLITNTRIM: &[Token] = &[Ext(K::Splitntrim)];
const BQSR: &[Token] = &[Ext(K::Bqsr)];
const GATK: &[Token] = &[Ext(K::Gatk)];
const FILTERING: &[Token] = &[Ext(K::Filtering)];
const ANNOVAR_INPUT: &[Token] = &[Ext(K::Annotation), Literal(ANNOVAR_INFIX)];
const DBSNP_FILTERED: &[Token] = &[Ext(K::Annotation), Literal(ANNOVAR_INFIX), Ext(K::Dbsnp)];
const VARIANT_FUNCTION: &[Token] = &[
    Ext(K::Annotation),
    Literal(ANNOVAR_INFIX),
    Ext(K::Dbsnp),
    Ext(K::Variant),
];
const EXONIC_FUNCTION: &[Token] = &[
    Ext(K::Annotation),
    Literal(ANNOVAR_INFIX),
    Ext(K::Dbsnp),
    Ext(K::Exonic),
];
const VARIANT_KEEP: &[Token] = &[
    Ext(K::Annotation),
    Literal(ANNOVAR_INFIX),
    Ext(K::Dbsnp),
    Ext(K::Variant),
    Ext(K::Keep),
];
const EXONIC_KEEP: &[Token] = &[
    Ext(K::Annotation),
    Literal(ANNOVAR_INFIX),
    Ext(K::Dbsnp),
    Ext(K::Exonic),
    Ext(K::Keep),
];

/// Inputs of the mode-dependent stages for one `(region_specific, two_pass)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRoute {
    pub mode: WorkflowMode,
    pub extract: InputSource,
    pub reorder: InputSource,
    pub replace_rg: InputSource,
}

/// Indexed by `region_specific * 2 + two_pass`.
pub const MODE_TABLE: [ModeRoute; 4] = [
    ModeRoute {
        mode: WorkflowMode {
            region_specific: false,
            two_pass: false,
        },
        extract: InputSource::Chain(ALIGNMENT_INDEX),
        reorder: InputSource::Chain(EXTRACT),
        replace_rg: InputSource::Chain(STAR2PASS),
    },
    ModeRoute {
        mode: WorkflowMode {
            region_specific: false,
            two_pass: true,
        },
        extract: InputSource::Chain(ALIGNMENT_INDEX),
        reorder: InputSource::Chain(EXTRACT),
        replace_rg: InputSource::Chain(STAR2PASS),
    },
    ModeRoute {
        mode: WorkflowMode {
            region_specific: true,
            two_pass: false,
        },
        extract: InputSource::SampleFile,
        reorder: InputSource::Chain(STAR_ALIGNMENT),
        replace_rg: InputSource::Chain(SORT),
    },
    ModeRoute {
        mode: WorkflowMode {
            region_specific: true,
            two_pass: true,
        },
        extract: InputSource::SampleFile,
        reorder: InputSource::Chain(STAR2PASS),
        replace_rg: InputSource::Chain(SORT),
    },
];

pub fn route_for(mode: WorkflowMode) -> &'static ModeRoute {
    &MODE_TABLE[usize::from(mode.region_specific) * 2 + usize::from(mode.two_pass)]
}

/// Input rule for the first tool step of each stage.
pub fn input_rule(stage: Stage, mode: WorkflowMode) -> InputSource {
    match stage {
        Stage::Alignment => InputSource::Read1,
        Stage::Extract => route_for(mode).extract,
        Stage::ReplaceRg => route_for(mode).replace_rg,
        Stage::Duplicates => InputSource::Chain(REPLACE_RG),
        Stage::Index | Stage::Splitntrim => InputSource::Chain(DUPLICATES),
        Stage::Bqsr | Stage::Gatk => InputSource::Chain(SPLITNTRIM),
        Stage::Bamfo | Stage::Samtools => InputSource::Chain(BQSR),
        Stage::VariantFiltering => InputSource::Chain(GATK),
        Stage::SnpdbFilt => InputSource::Chain(FILTERING),
        Stage::Annotation => InputSource::Chain(DBSNP_FILTERED),
    }
}

/// Location of a project's files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectLayout {
    output_dir: PathBuf,
    project: String,
}

impl ProjectLayout {
    pub fn new(output_dir: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn project_dir(&self) -> PathBuf {
        self.output_dir.join(&self.project)
    }

    /// `<project_dir>/<project>.<suffix>`
    pub fn file(&self, suffix: &str) -> PathBuf {
        self.project_dir().join(format!("{}.{}", self.project, suffix))
    }

    /// Output prefix handed to STAR; the tool appends its own file names.
    pub fn prefix(&self) -> String {
        format!("{}/{}.", self.project_dir().display(), self.project)
    }

    pub fn two_pass_prefix(&self) -> String {
        format!("{}{}", self.prefix(), TWO_PASS_PREFIX)
    }

    pub fn two_pass_genome_dir(&self) -> PathBuf {
        self.project_dir().join(TWO_PASS_GENOME_DIR)
    }

    pub fn log_file(&self) -> PathBuf {
        self.file("log")
    }

    pub fn report_file(&self) -> PathBuf {
        self.file("report.json")
    }

    pub fn duplicate_metrics(&self) -> PathBuf {
        self.file("duplicate_metrics.txt")
    }
}

/// Caller-supplied files that are not derived from the extension table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalInputs {
    pub read1: Option<PathBuf>,
    pub read2: Option<PathBuf>,
    pub sample_file: Option<PathBuf>,
}

/// Resolves stage paths for one project and one workflow mode.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    layout: &'a ProjectLayout,
    table: &'a ExtensionTable,
    inputs: &'a ExternalInputs,
    mode: WorkflowMode,
}

impl<'a> PathResolver<'a> {
    pub fn new(
        layout: &'a ProjectLayout,
        table: &'a ExtensionTable,
        inputs: &'a ExternalInputs,
        mode: WorkflowMode,
    ) -> Self {
        Self {
            layout,
            table,
            inputs,
            mode,
        }
    }

    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    pub fn layout(&self) -> &'a ProjectLayout {
        self.layout
    }

    pub fn inputs(&self) -> &'a ExternalInputs {
        self.inputs
    }

    /// Input path of `stage`'s first tool step.
    pub fn resolve_input(&self, stage: Stage) -> Result<PathBuf, WorkflowError> {
        self.source(stage, input_rule(stage, self.mode))
    }

    /// Canonical output of the step that writes `key`.
    pub fn output(&self, key: ExtensionKey) -> Result<PathBuf, WorkflowError> {
        self.chain(&[Ext(key)])
    }

    /// Input of the ReorderSam step inside `extract`.
    pub fn reorder_input(&self) -> Result<PathBuf, WorkflowError> {
        self.source(Stage::Extract, route_for(self.mode).reorder)
    }

    pub fn sort_input(&self) -> Result<PathBuf, WorkflowError> {
        self.chain(REORDER)
    }

    pub fn annovar_input(&self) -> Result<PathBuf, WorkflowError> {
        self.chain(ANNOVAR_INPUT)
    }

    pub fn dbsnp_filtered(&self) -> Result<PathBuf, WorkflowError> {
        self.chain(DBSNP_FILTERED)
    }

    pub fn variant_function(&self) -> Result<PathBuf, WorkflowError> {
        self.chain(VARIANT_FUNCTION)
    }

    pub fn exonic_function(&self) -> Result<PathBuf, WorkflowError> {
        self.chain(EXONIC_FUNCTION)
    }

    pub fn variant_keep(&self) -> Result<PathBuf, WorkflowError> {
        self.chain(VARIANT_KEEP)
    }

    pub fn exonic_keep(&self) -> Result<PathBuf, WorkflowError> {
        self.chain(EXONIC_KEEP)
    }

    fn source(&self, stage: Stage, source: InputSource) -> Result<PathBuf, WorkflowError> {
        match source {
            InputSource::Chain(tokens) => self.chain(tokens),
            InputSource::SampleFile => {
                self.external(stage, self.inputs.sample_file.as_deref(), "sample file")
            }
            InputSource::Read1 => self.external(stage, self.inputs.read1.as_deref(), "read1"),
        }
    }

    fn external(
        &self,
        stage: Stage,
        path: Option<&Path>,
        label: &str,
    ) -> Result<PathBuf, WorkflowError> {
        path.map(Path::to_path_buf).ok_or_else(|| {
            WorkflowError::Configuration(format!("stage {stage} requires a {label}"))
        })
    }

    fn chain(&self, tokens: &[Token]) -> Result<PathBuf, WorkflowError> {
        let parts = tokens
            .iter()
            .map(|token| match token {
                Ext(key) => self.table.extension_for(*key),
                Literal(text) => Ok(*text),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.layout.file(&parts.join(".")))
    }
}
