//! Image spec command - writes `xdvdfs.toml` from `-m` rules.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use imgcheck::image_spec::ImageSpec;

/// Emit the image spec to `output_file`, or to stdout when none is given.
pub fn cmd_image_spec_from(
    map_rules: &[String],
    meta_output: Option<String>,
    output_file: Option<&Path>,
) -> Result<()> {
    let spec = ImageSpec::from_rules(map_rules, meta_output)?;

    match output_file {
        Some(path) => spec.save(path)?,
        None => std::io::stdout()
            .write_all(spec.to_toml()?.as_bytes())
            .context("Failed to write image spec to stdout")?,
    }
    Ok(())
}
