//! Configuration management for the rnavar workflow driver.
//!
//! Settings are layered, last wins:
//! - built-in defaults (home-relative reference locations)
//! - JSON config file (`~/.rnavar/config` or an explicit path)
//! - `RNAVAR_*` environment variables
//! - command-line flags, applied by the CLI through [`ConfigBuilder`]

mod builder;
mod constants;
mod defaults;
mod environment;
mod loader;
mod types;
mod validation;

pub use builder::ConfigBuilder;
#[allow(unused_imports)]
pub use types::{Config, PathSettings, RunSettings, ToolSettings};
