//! Tool command lines for each stage, built from already-resolved paths.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;

use super::error::WorkflowError;
use super::extensions::ExtensionKey;
use super::resolver::PathResolver;
use super::types::Stage;

/// One external program invocation, optionally piped into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub pipe_to: Option<Box<ToolCommand>>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            pipe_to: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn path(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// `KEY=value` argument in Picard style.
    pub fn kv(self, key: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("{key}={value}"))
    }

    pub fn flag_path(self, flag: &str, path: &Path) -> Self {
        self.arg(flag).path(path)
    }

    pub fn pipe(mut self, next: ToolCommand) -> Self {
        self.pipe_to = Some(Box::new(next));
        self
    }

    /// Shell command line, quoting arguments that need it.
    pub fn render(&self) -> String {
        let mut line = shell_quote(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        if let Some(next) = &self.pipe_to {
            line.push_str(" | ");
            line.push_str(&next.render());
        }
        line
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Which tool call a step is; names the step in logs and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Alignment,
    AlignmentIndex,
    Realign,
    Extract,
    Reorder,
    Sort,
    ReplaceRg,
    Duplicates,
    Index,
    Splitntrim,
    Recalibrate,
    Bqsr,
    Bamfo,
    Samtools,
    Gatk,
    Filtering,
    Annotation,
    Dbsnp,
    Geneanno,
}

impl StepKind {
    pub fn name(self) -> &'static str {
        match self {
            StepKind::Alignment => "alignment",
            StepKind::AlignmentIndex => "alignment_index",
            StepKind::Realign => "realign",
            StepKind::Extract => "extract",
            StepKind::Reorder => "reorder",
            StepKind::Sort => "sort",
            StepKind::ReplaceRg => "replace_rg",
            StepKind::Duplicates => "duplicates",
            StepKind::Index => "index",
            StepKind::Splitntrim => "splitntrim",
            StepKind::Recalibrate => "recalibrate",
            StepKind::Bqsr => "bqsr",
            StepKind::Bamfo => "bamfo",
            StepKind::Samtools => "samtools",
            StepKind::Gatk => "gatk",
            StepKind::Filtering => "filtering",
            StepKind::Annotation => "annotation",
            StepKind::Dbsnp => "dbsnp",
            StepKind::Geneanno => "geneanno",
        }
    }

    /// Progress message logged when the step starts.
    pub fn message(self) -> &'static str {
        match self {
            StepKind::Alignment => "Aligning reads with STAR",
            StepKind::AlignmentIndex => "Regenerating STAR genome from first-pass junctions",
            StepKind::Realign => "Realigning reads against the two-pass genome",
            StepKind::Extract => "Extracting alignments",
            StepKind::Reorder => "Reordering BAM to match the reference",
            StepKind::Sort => "Sorting BAM by coordinate",
            StepKind::ReplaceRg => "Replacing read groups",
            StepKind::Duplicates => "Marking duplicates",
            StepKind::Index => "Indexing BAM",
            StepKind::Splitntrim => "Splitting reads at N CIGAR operations",
            StepKind::Recalibrate => "Computing base quality recalibration table",
            StepKind::Bqsr => "Applying base quality recalibration",
            StepKind::Bamfo => "Calling variants with BAMFO",
            StepKind::Samtools => "Calling variants with samtools/bcftools",
            StepKind::Gatk => "Calling variants with HaplotypeCaller",
            StepKind::Filtering => "Filtering variants",
            StepKind::Annotation => "Converting VCF to ANNOVAR input",
            StepKind::Dbsnp => "Filtering against dbSNP",
            StepKind::Geneanno => "Annotating genes",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One tool call inside a stage together with the workflow files it reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStep {
    pub kind: StepKind,
    pub command: ToolCommand,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

impl ToolStep {
    fn new(kind: StepKind, command: ToolCommand) -> Self {
        Self {
            kind,
            command,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn reads(mut self, path: PathBuf) -> Self {
        self.inputs.push(path);
        self
    }

    fn writes(mut self, path: PathBuf) -> Self {
        self.outputs.push(path);
        self
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

/// A stage ready to run: its primary input and its tool steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageInvocation {
    pub stage: Stage,
    pub input: PathBuf,
    pub steps: Vec<ToolStep>,
    /// Files left for downstream tooling outside this workflow.
    pub handoff: Vec<PathBuf>,
}

impl StageInvocation {
    fn new(stage: Stage, input: PathBuf) -> Self {
        Self {
            stage,
            input,
            steps: Vec::new(),
            handoff: Vec::new(),
        }
    }

    fn step(mut self, step: ToolStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn outputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.steps.iter().flat_map(|step| step.outputs.iter())
    }

    /// Files that must exist before the stage starts: every step input not
    /// written by an earlier step of the same stage, in step order.
    pub fn required(&self) -> Vec<PathBuf> {
        let mut written: HashSet<&PathBuf> = HashSet::new();
        let mut required: Vec<PathBuf> = Vec::new();
        for step in &self.steps {
            for input in &step.inputs {
                if !written.contains(input) && !required.contains(input) {
                    required.push(input.clone());
                }
            }
            written.extend(step.outputs.iter());
        }
        required
    }
}

/// Builds stage invocations from a resolver and the tool configuration.
pub struct StageCommands<'a> {
    resolver: PathResolver<'a>,
    config: &'a Config,
    region: Option<&'a str>,
}

impl<'a> StageCommands<'a> {
    pub fn new(resolver: PathResolver<'a>, config: &'a Config, region: Option<&'a str>) -> Self {
        Self {
            resolver,
            config,
            region,
        }
    }

    pub fn invocation(&self, stage: Stage) -> Result<StageInvocation, WorkflowError> {
        let input = self.resolver.resolve_input(stage)?;
        let invocation = StageInvocation::new(stage, input.clone());
        let r = &self.resolver;

        let invocation = match stage {
            Stage::Alignment => return self.alignment(invocation),
            Stage::Extract => {
                let extracted = r.output(ExtensionKey::Extract)?;
                let mut view = ToolCommand::new(&self.config.tools.samtools)
                    .arg("view")
                    .arg("-b")
                    .flag_path("-o", &extracted)
                    .path(&input);
                if let Some(region) = self.region {
                    view = view.arg(region);
                }
                let reorder_input = r.reorder_input()?;
                let reordered = r.output(ExtensionKey::Reorder)?;
                let sort_input = r.sort_input()?;
                let sorted = r.output(ExtensionKey::Sort)?;
                invocation
                    .step(
                        ToolStep::new(StepKind::Extract, view)
                            .reads(input.clone())
                            .writes(extracted),
                    )
                    .step(
                        ToolStep::new(
                            StepKind::Reorder,
                            self.picard("ReorderSam")
                                .kv("I", reorder_input.display())
                                .kv("O", reordered.display())
                                .kv("R", self.reference().display()),
                        )
                        .reads(reorder_input)
                        .writes(reordered),
                    )
                    .step(
                        ToolStep::new(
                            StepKind::Sort,
                            self.picard("SortSam")
                                .kv("I", sort_input.display())
                                .kv("O", sorted.display())
                                .kv("SO", "coordinate"),
                        )
                        .reads(sort_input)
                        .writes(sorted),
                    )
            }
            Stage::ReplaceRg => {
                let output = r.output(ExtensionKey::ReplaceRg)?;
                let project = r.layout().project();
                let command = self
                    .picard("AddOrReplaceReadGroups")
                    .kv("I", input.display())
                    .kv("O", output.display())
                    .kv("RGID", project)
                    .kv("RGLB", project)
                    .kv("RGPL", "illumina")
                    .kv("RGPU", project)
                    .kv("RGSM", project);
                invocation.step(
                    ToolStep::new(StepKind::ReplaceRg, command)
                        .reads(input.clone())
                        .writes(output),
                )
            }
            Stage::Duplicates => {
                let output = r.output(ExtensionKey::Duplicates)?;
                let metrics = r.layout().duplicate_metrics();
                let command = self
                    .picard("MarkDuplicates")
                    .kv("I", input.display())
                    .kv("O", output.display())
                    .kv("CREATE_INDEX", "true")
                    .kv("VALIDATION_STRINGENCY", "SILENT")
                    .kv("M", metrics.display());
                invocation.step(
                    ToolStep::new(StepKind::Duplicates, command)
                        .reads(input.clone())
                        .writes(output)
                        .writes(metrics),
                )
            }
            Stage::Index => {
                let index = PathBuf::from(format!("{}.bai", input.display()));
                let command = ToolCommand::new(&self.config.tools.samtools)
                    .arg("index")
                    .path(&input);
                invocation.step(
                    ToolStep::new(StepKind::Index, command)
                        .reads(input.clone())
                        .writes(index),
                )
            }
            Stage::Splitntrim => {
                let output = r.output(ExtensionKey::Splitntrim)?;
                let command = self
                    .gatk("SplitNCigarReads")
                    .flag_path("-I", &input)
                    .flag_path("-o", &output)
                    .arg("-rf")
                    .arg("ReassignOneMappingQuality")
                    .arg("-RMQF")
                    .arg("255")
                    .arg("-RMQT")
                    .arg("60")
                    .arg("-U")
                    .arg("ALLOW_N_CIGAR_READS");
                invocation.step(
                    ToolStep::new(StepKind::Splitntrim, command)
                        .reads(input.clone())
                        .writes(output),
                )
            }
            Stage::Bqsr => {
                let recal = r.output(ExtensionKey::Recal)?;
                let output = r.output(ExtensionKey::Bqsr)?;
                let mut recalibrate = self
                    .gatk("BaseRecalibrator")
                    .flag_path("-I", &input)
                    .flag_path("-o", &recal);
                if let Some(known) = &self.config.paths.known_sites {
                    recalibrate = recalibrate.flag_path("-knownSites", known);
                }
                let apply = self
                    .gatk("PrintReads")
                    .flag_path("-I", &input)
                    .flag_path("-BQSR", &recal)
                    .flag_path("-o", &output);
                invocation
                    .step(
                        ToolStep::new(StepKind::Recalibrate, recalibrate)
                            .reads(input.clone())
                            .writes(recal.clone()),
                    )
                    .step(
                        ToolStep::new(StepKind::Bqsr, apply)
                            .reads(input.clone())
                            .reads(recal)
                            .writes(output),
                    )
            }
            Stage::Bamfo => {
                let output = r.output(ExtensionKey::Bamfo)?;
                let command = ToolCommand::new(&self.config.tools.java)
                    .arg("-jar")
                    .path(&self.config.tools.bamfo_jar)
                    .flag_path("-i", &input)
                    .flag_path("-r", self.reference())
                    .flag_path("-o", &output);
                invocation.step(
                    ToolStep::new(StepKind::Bamfo, command)
                        .reads(input.clone())
                        .writes(output),
                )
            }
            Stage::Samtools => {
                let output = r.output(ExtensionKey::Samtools)?;
                let command = ToolCommand::new(&self.config.tools.samtools)
                    .arg("mpileup")
                    .arg("-u")
                    .flag_path("-f", self.reference())
                    .path(&input)
                    .pipe(
                        ToolCommand::new(&self.config.tools.bcftools)
                            .arg("call")
                            .arg("-mv")
                            .arg("-Ov")
                            .flag_path("-o", &output),
                    );
                invocation.step(
                    ToolStep::new(StepKind::Samtools, command)
                        .reads(input.clone())
                        .writes(output),
                )
            }
            Stage::Gatk => {
                let output = r.output(ExtensionKey::Gatk)?;
                let command = self
                    .gatk("HaplotypeCaller")
                    .flag_path("-I", &input)
                    .arg("-dontUseSoftClippedBases")
                    .arg("-stand_call_conf")
                    .arg("20.0")
                    .flag_path("-o", &output);
                invocation.step(
                    ToolStep::new(StepKind::Gatk, command)
                        .reads(input.clone())
                        .writes(output),
                )
            }
            Stage::VariantFiltering => {
                let output = r.output(ExtensionKey::Filtering)?;
                let command = self
                    .gatk("VariantFiltration")
                    .flag_path("-V", &input)
                    .arg("-window")
                    .arg("35")
                    .arg("-cluster")
                    .arg("3")
                    .arg("-filterName")
                    .arg("FS")
                    .arg("-filter")
                    .arg("FS > 30.0")
                    .arg("-filterName")
                    .arg("QD")
                    .arg("-filter")
                    .arg("QD < 2.0")
                    .flag_path("-o", &output);
                invocation.step(
                    ToolStep::new(StepKind::Filtering, command)
                        .reads(input.clone())
                        .writes(output),
                )
            }
            Stage::SnpdbFilt => {
                let avinput = r.annovar_input()?;
                let filtered = r.dbsnp_filtered()?;
                let convert = self
                    .annovar_script("convert2annovar.pl")
                    .arg("-format")
                    .arg("vcf4")
                    .path(&input)
                    .flag_path("-outfile", &avinput);
                let filter = self
                    .annovar_script("annotate_variation.pl")
                    .arg("-filter")
                    .arg("-dbtype")
                    .arg(&self.config.run.dbsnp_table)
                    .arg("-buildver")
                    .arg(&self.config.run.genome_build)
                    .path(&avinput)
                    .path(&self.annovar_db());
                invocation
                    .step(
                        ToolStep::new(StepKind::Annotation, convert)
                            .reads(input.clone())
                            .writes(avinput.clone()),
                    )
                    .step(
                        ToolStep::new(StepKind::Dbsnp, filter)
                            .reads(avinput)
                            .writes(filtered),
                    )
            }
            Stage::Annotation => {
                let command = self
                    .annovar_script("annotate_variation.pl")
                    .arg("-geneanno")
                    .arg("-buildver")
                    .arg(&self.config.run.genome_build)
                    .path(&input)
                    .path(&self.annovar_db());
                let mut invocation = invocation.step(
                    ToolStep::new(StepKind::Geneanno, command)
                        .reads(input.clone())
                        .writes(r.variant_function()?)
                        .writes(r.exonic_function()?),
                );
                invocation.handoff = vec![r.variant_keep()?, r.exonic_keep()?];
                invocation
            }
        };
        Ok(invocation)
    }

    fn alignment(&self, mut invocation: StageInvocation) -> Result<StageInvocation, WorkflowError> {
        let r = &self.resolver;
        let layout = r.layout();
        let read2 = r.inputs().read2.clone();

        let first_pass = self
            .star_align(
                StepKind::Alignment,
                &self.config.paths.star_genome,
                &invocation.input,
                read2.as_deref(),
                &layout.prefix(),
            )
            .writes(r.output(ExtensionKey::StarAlignment)?)
            .writes(r.output(ExtensionKey::SjOutTab)?);
        invocation = invocation.step(first_pass);

        if r.mode().two_pass {
            let genome_dir = layout.two_pass_genome_dir();
            let junctions = r.output(ExtensionKey::SjOutTab)?;
            let index = ToolCommand::new(&self.config.tools.star)
                .arg("--runMode")
                .arg("genomeGenerate")
                .flag_path("--genomeDir", &genome_dir)
                .flag_path("--genomeFastaFiles", self.reference())
                .flag_path("--sjdbFileChrStartEnd", &junctions)
                .arg("--sjdbOverhang")
                .arg(self.config.run.sjdb_overhang.to_string())
                .arg("--runThreadN")
                .arg(self.config.run.num_cpus.to_string())
                .arg("--outFileNamePrefix")
                .arg(layout.prefix());
            let second_pass = self.star_align(
                StepKind::Realign,
                &genome_dir,
                &invocation.input,
                read2.as_deref(),
                &layout.two_pass_prefix(),
            );
            invocation = invocation
                .step(
                    ToolStep::new(StepKind::AlignmentIndex, index)
                        .reads(junctions)
                        .writes(genome_dir.clone()),
                )
                .step(
                    second_pass
                        .reads(genome_dir)
                        .writes(r.output(ExtensionKey::Star2Pass)?),
                );
        }

        Ok(invocation)
    }

    fn star_align(
        &self,
        kind: StepKind,
        genome_dir: &Path,
        read1: &Path,
        read2: Option<&Path>,
        prefix: &str,
    ) -> ToolStep {
        let mut command = ToolCommand::new(&self.config.tools.star)
            .arg("--runThreadN")
            .arg(self.config.run.num_cpus.to_string())
            .flag_path("--genomeDir", genome_dir)
            .flag_path("--readFilesIn", read1);
        if let Some(read2) = read2 {
            command = command.path(read2);
        }
        if read1.extension().is_some_and(|ext| ext == "gz") {
            command = command.arg("--readFilesCommand").arg("zcat");
        }
        command = command.arg("--outFileNamePrefix").arg(prefix);
        let mut step = ToolStep::new(kind, command).reads(read1.to_path_buf());
        if let Some(read2) = read2 {
            step = step.reads(read2.to_path_buf());
        }
        step
    }

    fn reference(&self) -> &Path {
        &self.config.paths.ref_genome
    }

    fn picard(&self, tool: &str) -> ToolCommand {
        ToolCommand::new(&self.config.tools.java)
            .arg("-jar")
            .path(&self.config.tools.picard_jar)
            .arg(tool)
    }

    fn gatk(&self, tool: &str) -> ToolCommand {
        ToolCommand::new(&self.config.tools.java)
            .arg("-jar")
            .path(&self.config.tools.gatk_jar)
            .arg("-T")
            .arg(tool)
            .flag_path("-R", self.reference())
    }

    fn annovar_script(&self, script: &str) -> ToolCommand {
        ToolCommand::new(&self.config.tools.perl).path(&self.config.paths.annovar_dir.join(script))
    }

    fn annovar_db(&self) -> PathBuf {
        self.config.paths.annovar_dir.join("humandb")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::config::Config;
    use crate::workflow::extensions::ExtensionTable;
    use crate::workflow::resolver::{ExternalInputs, ProjectLayout};
    use crate::workflow::types::WorkflowMode;

    use super::*;

    fn config() -> Config {
        Config::builder()
            .with_paths(|paths| {
                paths.ref_genome = PathBuf::from("/ref/hg19.fa");
                paths.star_genome = PathBuf::from("/ref/star");
                paths.annovar_dir = PathBuf::from("/opt/annovar");
            })
            .build()
            .unwrap()
    }

    fn invocation(stage: Stage, mode: WorkflowMode, region: Option<&str>) -> StageInvocation {
        let layout = ProjectLayout::new("/out", "s1");
        let table = ExtensionTable::builtin().unwrap();
        let inputs = ExternalInputs {
            read1: Some(PathBuf::from("/reads/r1.fq.gz")),
            read2: Some(PathBuf::from("/reads/r2.fq.gz")),
            sample_file: Some(PathBuf::from("/bams/s1.bam")),
        };
        let config = config();
        let resolver = PathResolver::new(&layout, &table, &inputs, mode);
        StageCommands::new(resolver, &config, region)
            .invocation(stage)
            .unwrap()
    }

    #[test]
    fn render_quotes_only_unsafe_arguments() {
        let command = ToolCommand::new("gatk")
            .arg("-filter")
            .arg("FS > 30.0")
            .arg("it's")
            .kv("I", "/a/b.bam");
        assert_eq!(command.render(), r"gatk -filter 'FS > 30.0' 'it'\''s' I=/a/b.bam");
    }

    #[test]
    fn single_pass_alignment_is_one_star_call() {
        let invocation = invocation(Stage::Alignment, WorkflowMode::default(), None);
        assert_eq!(invocation.steps.len(), 1);
        assert_eq!(
            invocation.required(),
            vec![PathBuf::from("/reads/r1.fq.gz"), PathBuf::from("/reads/r2.fq.gz")]
        );
        let line = invocation.steps[0].command.render();
        assert!(line.contains("--readFilesIn /reads/r1.fq.gz /reads/r2.fq.gz"));
        assert!(line.contains("--readFilesCommand zcat"));
        assert!(line.ends_with("--outFileNamePrefix /out/s1/s1."));
    }

    #[test]
    fn two_pass_alignment_regenerates_genome_and_realigns() {
        let invocation = invocation(Stage::Alignment, WorkflowMode::new(false, true), None);
        let kinds: Vec<_> = invocation.steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![StepKind::Alignment, StepKind::AlignmentIndex, StepKind::Realign]
        );
        assert_eq!(
            invocation.required(),
            vec![PathBuf::from("/reads/r1.fq.gz"), PathBuf::from("/reads/r2.fq.gz")]
        );

        let index = invocation.steps[1].command.render();
        assert!(index.contains("--genomeDir /out/s1/star_2pass"));
        assert!(index.contains("--sjdbFileChrStartEnd /out/s1/s1.SJ.out.tab"));
        assert!(index.contains("--sjdbOverhang 75"));

        let realign = invocation.steps[2].command.render();
        assert!(realign.contains("--genomeDir /out/s1/star_2pass"));
        assert!(realign.ends_with("--outFileNamePrefix /out/s1/s1.2pass_"));
        assert_eq!(
            invocation.steps[2].outputs,
            vec![PathBuf::from("/out/s1/s1.2pass_Aligned.out.sam")]
        );
    }

    #[test]
    fn region_extract_uses_sample_file_and_region() {
        let invocation = invocation(
            Stage::Extract,
            WorkflowMode::new(true, false),
            Some("20:30946147-31027122"),
        );
        assert_eq!(invocation.input, PathBuf::from("/bams/s1.bam"));
        assert_eq!(
            invocation.steps[0].command.render(),
            "samtools view -b -o /out/s1/s1.extract.bam /bams/s1.bam 20:30946147-31027122"
        );
        assert!(
            invocation.steps[1]
                .command
                .render()
                .contains("I=/out/s1/s1.Aligned.out.sam")
        );
        assert!(
            invocation.steps[2]
                .command
                .render()
                .contains("I=/out/s1/s1.reorder.bam")
        );
        assert_eq!(
            invocation.required(),
            vec![
                PathBuf::from("/bams/s1.bam"),
                PathBuf::from("/out/s1/s1.Aligned.out.sam"),
            ]
        );
    }

    #[test]
    fn whole_sample_extract_requires_only_the_alignment() {
        let invocation = invocation(Stage::Extract, WorkflowMode::new(false, true), None);
        assert_eq!(
            invocation.required(),
            vec![PathBuf::from("/out/s1/s1.Aligned.out.sam")]
        );
    }

    #[test]
    fn bqsr_recalibration_table_is_not_an_upstream_requirement() {
        let invocation = invocation(Stage::Bqsr, WorkflowMode::default(), None);
        assert_eq!(invocation.steps[1].inputs.len(), 2);
        assert_eq!(
            invocation.required(),
            vec![PathBuf::from("/out/s1/s1.split.bam")]
        );
    }

    #[test]
    fn step_kinds_have_distinct_names() {
        let invocation = invocation(Stage::Alignment, WorkflowMode::new(false, true), None);
        let names: Vec<_> = invocation.steps.iter().map(|s| s.kind.to_string()).collect();
        assert_eq!(names, vec!["alignment", "alignment_index", "realign"]);
        assert_eq!(
            StepKind::Realign.message(),
            "Realigning reads against the two-pass genome"
        );
    }

    #[test]
    fn samtools_calling_pipes_into_bcftools() {
        let invocation = invocation(Stage::Samtools, WorkflowMode::default(), None);
        assert_eq!(
            invocation.steps[0].command.render(),
            "samtools mpileup -u -f /ref/hg19.fa /out/s1/s1.bqsr.bam | bcftools call -mv -Ov -o /out/s1/s1.samtools.vcf"
        );
    }

    #[test]
    fn snpdb_filter_feeds_annovar_input_to_dbsnp_filter() {
        let invocation = invocation(Stage::SnpdbFilt, WorkflowMode::default(), None);
        assert_eq!(invocation.input, PathBuf::from("/out/s1/s1.filtered.vcf"));
        let filter = invocation.steps[1].command.render();
        assert_eq!(
            filter,
            "perl /opt/annovar/annotate_variation.pl -filter -dbtype snp138NonFlagged -buildver hg19 /out/s1/s1.avinput.annovar /opt/annovar/humandb"
        );
    }

    #[test]
    fn annotation_reports_keep_files_as_handoff() {
        let invocation = invocation(Stage::Annotation, WorkflowMode::default(), None);
        assert_eq!(
            invocation.handoff,
            vec![
                PathBuf::from(
                    "/out/s1/s1.avinput.annovar.hg19_snp138NonFlagged_filtered.variant_function.keep"
                ),
                PathBuf::from(
                    "/out/s1/s1.avinput.annovar.hg19_snp138NonFlagged_filtered.exonic_variant_function.keep"
                ),
            ]
        );
    }

    #[test]
    fn every_stage_builds_at_least_one_step() {
        for stage in Stage::ALL {
            let invocation = invocation(stage, WorkflowMode::new(true, true), Some("1:1-100"));
            assert!(!invocation.steps.is_empty(), "{stage}");
            assert!(invocation.outputs().count() > 0, "{stage}");
        }
    }
}
