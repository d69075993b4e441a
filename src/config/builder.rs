use anyhow::Result;

use super::types::{Config, PathSettings, RunSettings, ToolSettings};

#[derive(Debug)]
pub struct ConfigBuilder {
    pub(super) paths: PathSettings,
    pub(super) tools: ToolSettings,
    pub(super) run: RunSettings,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            paths: PathSettings::default(),
            tools: ToolSettings::default(),
            run: RunSettings::default(),
        }
    }

    pub fn with_paths<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut PathSettings),
    {
        update(&mut self.paths);
        self
    }

    pub fn with_tools<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut ToolSettings),
    {
        update(&mut self.tools);
        self
    }

    pub fn with_run<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut RunSettings),
    {
        update(&mut self.run);
        self
    }

    pub fn build(self) -> Result<Config> {
        Ok(Config {
            paths: self.paths,
            tools: self.tools,
            run: self.run,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
