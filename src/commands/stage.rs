//! Stage command - lay out the mapped image tree on disk.

use anyhow::Result;
use std::path::Path;

use imgcheck::mapping::MappingSpec;
use imgcheck::rules::RuleSet;

/// Where the staged files come from.
pub enum StageInput<'a> {
    Rules(RuleSet),
    /// A mapping saved by `resolve --mapping-out`.
    Mapping(&'a Path),
}

/// Copy every mapped file from `source` to its image path under `dest`.
pub fn cmd_stage(input: StageInput<'_>, source: &Path, dest: &Path) -> Result<()> {
    let mapping = match input {
        StageInput::Rules(rules) => rules.resolve(source)?,
        StageInput::Mapping(path) => MappingSpec::load(path)?,
    };

    mapping.materialize(source, dest)?;
    println!(
        "Staged {} file(s) into {}",
        mapping.included().len(),
        dest.display()
    );
    Ok(())
}
