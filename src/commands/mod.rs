//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `run` - Run the built-in test cases
//! - `resolve` - Show where map rules put each source file
//! - `image_spec` - Emit an image spec file from map rules
//! - `stage` - Build the mapped tree on disk
//! - `show` - Display information
//! - `preflight` - Run preflight checks

mod image_spec;
mod preflight;
mod resolve;
mod run;
pub mod show;
mod stage;

pub use image_spec::cmd_image_spec_from;
pub use preflight::cmd_preflight;
pub use resolve::cmd_resolve;
pub use run::{cmd_run, ToolOverrides};
pub use show::cmd_show;
pub use stage::{cmd_stage, StageInput};

use anyhow::{bail, Result};
use std::path::Path;

use imgcheck::image_spec::ImageSpec;
use imgcheck::rules::RuleSet;

/// Spec file looked up in the source directory when no rules are given.
pub const DEFAULT_SPEC_FILE: &str = "xdvdfs.toml";

/// Rules from `-f`, else from `-m`, else from `SOURCE/xdvdfs.toml`.
pub fn load_rules(map_rules: &[String], spec_file: Option<&Path>, source: &Path) -> Result<RuleSet> {
    if let Some(path) = spec_file {
        return ImageSpec::load(path)?.rule_set();
    }
    if !map_rules.is_empty() {
        return Ok(RuleSet::parse(map_rules)?);
    }

    let default = source.join(DEFAULT_SPEC_FILE);
    if default.exists() {
        return ImageSpec::load(&default)?.rule_set();
    }
    bail!(
        "No map rules given. Pass -m RULE or -f FILE, or create {}",
        default.display()
    )
}
