//! Resolve command - dry run of map rules over a source tree.

use anyhow::Result;
use std::path::Path;

use imgcheck::rules::RuleSet;

/// Print `source -> image path` for each included file.
pub fn cmd_resolve(rules: &RuleSet, source: &Path, mapping_out: Option<&Path>) -> Result<()> {
    let mapping = rules.resolve(source)?;

    for file in mapping.included() {
        println!("{} -> {}", file.source, file.dest);
    }
    for file in mapping.excluded() {
        println!("{} (excluded)", file);
    }

    if let Some(path) = mapping_out {
        mapping.save(path)?;
        println!("Mapping written to {}", path.display());
    }
    Ok(())
}
