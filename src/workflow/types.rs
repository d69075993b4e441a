use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::WorkflowError;

/// Stages of the variant-calling workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Alignment,
    Extract,
    ReplaceRg,
    Duplicates,
    Index,
    Splitntrim,
    Bqsr,
    Bamfo,
    Samtools,
    Gatk,
    VariantFiltering,
    SnpdbFilt,
    Annotation,
}

impl Stage {
    pub const ALL: [Stage; 13] = [
        Stage::Alignment,
        Stage::Extract,
        Stage::ReplaceRg,
        Stage::Duplicates,
        Stage::Index,
        Stage::Splitntrim,
        Stage::Bqsr,
        Stage::Bamfo,
        Stage::Samtools,
        Stage::Gatk,
        Stage::VariantFiltering,
        Stage::SnpdbFilt,
        Stage::Annotation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Alignment => "alignment",
            Stage::Extract => "extract",
            Stage::ReplaceRg => "replace_rg",
            Stage::Duplicates => "duplicates",
            Stage::Index => "index",
            Stage::Splitntrim => "splitntrim",
            Stage::Bqsr => "bqsr",
            Stage::Bamfo => "bamfo",
            Stage::Samtools => "samtools",
            Stage::Gatk => "gatk",
            Stage::VariantFiltering => "variant_filtering",
            Stage::SnpdbFilt => "snpdb_filt",
            Stage::Annotation => "annotation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| WorkflowError::Configuration(format!("unknown stage '{s}'")))
    }
}

/// Workflow variant captured once at startup and never changed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorkflowMode {
    pub region_specific: bool,
    pub two_pass: bool,
}

impl WorkflowMode {
    pub fn new(region_specific: bool, two_pass: bool) -> Self {
        Self {
            region_specific,
            two_pass,
        }
    }
}

/// The stages a run will execute, always iterated in the fixed stage order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StagePlan {
    selected: Vec<Stage>,
}

impl StagePlan {
    pub const WILDCARD: &'static str = "all";

    /// Builds a plan from a selector: `all`, a stage name, or a comma separated
    /// list of stage names. Tokens naming no stage select nothing; upstream
    /// stages are never pulled in implicitly.
    pub fn from_selector(selector: &str) -> Self {
        let tokens: Vec<&str> = selector
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.contains(&Self::WILDCARD) {
            return Self::all();
        }

        let selected = Stage::ALL
            .into_iter()
            .filter(|stage| tokens.contains(&stage.name()))
            .collect();
        Self { selected }
    }

    pub fn all() -> Self {
        Self {
            selected: Stage::ALL.to_vec(),
        }
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.selected.contains(&stage)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selector tokens that did not name a stage.
    pub fn unknown_tokens(selector: &str) -> Vec<String> {
        selector
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty() && *token != Self::WILDCARD)
            .filter(|token| token.parse::<Stage>().is_err())
            .map(str::to_string)
            .collect()
    }
}
