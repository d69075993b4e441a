//! Logical file-extension names and the table mapping them to suffixes.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::error::WorkflowError;

const DEFAULT_TABLE: &str = include_str!("../../data/file_extension.txt");

/// Logical names looked up in the extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKey {
    SjOutTab,
    StarAlignment,
    Star2Pass,
    AlignmentIndex,
    Extract,
    Reorder,
    Sort,
    ReplaceRg,
    Duplicates,
    Splitntrim,
    Recal,
    Bqsr,
    Bamfo,
    Samtools,
    Gatk,
    Filtering,
    Annotation,
    Dbsnp,
    Variant,
    Exonic,
    Keep,
}

impl ExtensionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtensionKey::SjOutTab => "sj_out_tab",
            ExtensionKey::StarAlignment => "star_alignment",
            ExtensionKey::Star2Pass => "star2pass",
            ExtensionKey::AlignmentIndex => "alignment_index",
            ExtensionKey::Extract => "extract",
            ExtensionKey::Reorder => "reorder",
            ExtensionKey::Sort => "sort",
            ExtensionKey::ReplaceRg => "replace_rg",
            ExtensionKey::Duplicates => "duplicates",
            ExtensionKey::Splitntrim => "splitntrim",
            ExtensionKey::Recal => "recal",
            ExtensionKey::Bqsr => "bqsr",
            ExtensionKey::Bamfo => "bamfo",
            ExtensionKey::Samtools => "samtools",
            ExtensionKey::Gatk => "gatk",
            ExtensionKey::Filtering => "filtering",
            ExtensionKey::Annotation => "annotation",
            ExtensionKey::Dbsnp => "dbsnp",
            ExtensionKey::Variant => "variant",
            ExtensionKey::Exonic => "exonic",
            ExtensionKey::Keep => "keep",
        }
    }
}

impl fmt::Display for ExtensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable mapping from logical name to extension, loaded once per run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtensionTable {
    entries: HashMap<String, String>,
}

impl ExtensionTable {
    /// Parses `key value` lines. Blank lines and `#` comments are ignored and a
    /// repeated key keeps its last value.
    pub fn parse(text: &str) -> Result<Self, WorkflowError> {
        let mut entries = HashMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default();
            let value = parts.next().map(str::trim).unwrap_or_default();
            if value.is_empty() {
                return Err(WorkflowError::ExtensionTableParse {
                    line: idx + 1,
                    content: raw.to_string(),
                });
            }
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed reading extension table at {}", path.display()))?;
        let table = Self::parse(&contents)
            .with_context(|| format!("Failed parsing extension table at {}", path.display()))?;
        if table.is_empty() {
            bail!("Extension table at {} has no entries", path.display());
        }
        Ok(table)
    }

    /// The table compiled into the binary.
    pub fn builtin() -> Result<Self, WorkflowError> {
        Self::parse(DEFAULT_TABLE)
    }

    pub fn extension_for(&self, key: ExtensionKey) -> Result<&str, WorkflowError> {
        self.entries
            .get(key.as_str())
            .map(String::as_str)
            .ok_or_else(|| WorkflowError::UnknownExtension {
                key: key.as_str().to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn without(mut self, key: ExtensionKey) -> Self {
        self.entries.remove(key.as_str());
        self
    }
}
