//! Build an image from map rules and check it against a declared image tree.
//!
//! The fixture has a `source/` tree and the `dest/` tree the rules should
//! turn it into. The case first checks that the rules resolve to `dest/`
//! on their own, then that the image tool agrees, both when given the rules
//! directly and when given an image spec file emitted from them.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::{CaseContext, TestCase};
use crate::common::write_file_with_dirs;
use crate::mapping::MappingSpec;
use crate::oracle::{verify, RoundTripOracle, Stage};
use crate::rules::RuleSet;

const RULES: [&str; 7] = [
    "bin:/",
    "assets/**:/{0}",
    "**/*.always:/always/{2}",
    "a/specific.ext1:/specific.ext1",
    "**/*.{ext1,ext2}:/{3}/{2}",
    "!**/excluded",
    "assets/excluded:assets/excluded",
];

/// (source path, image path, content); `None` means the rules drop the file.
const FILES: [(&str, Option<&str>, &str); 12] = [
    ("bin/default.xbe", Some("default.xbe"), "default.xbe"),
    ("assets/asset1", Some("assets/asset1"), "asset1"),
    ("assets/asset2", Some("assets/asset2"), "asset2"),
    ("assets/excluded", Some("assets/excluded"), "excluded"),
    ("a/specific.ext1", Some("specific.ext1"), "specific.ext1"),
    ("a/file1.ext1", Some("ext1/file1"), "file1.ext1"),
    ("b/file2.ext1", Some("ext1/file2"), "file2.ext1"),
    ("a/file1.ext2", Some("ext2/file1"), "file1.ext2"),
    ("b/file2.ext2", Some("ext2/file2"), "file2.ext2"),
    ("a/file.always", Some("always/file"), "file.always"),
    ("a/excluded", None, "excluded"),
    ("b/excluded", None, "excluded"),
];

pub struct BuildImage {
    rules: RuleSet,
}

impl BuildImage {
    pub fn new() -> Result<Self> {
        let rules = RuleSet::parse(RULES).context("BuildImage rules do not compile")?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The rules as `-m` arguments.
    fn options() -> Vec<String> {
        RULES
            .iter()
            .flat_map(|rule| ["-m".to_string(), rule.to_string()])
            .collect()
    }

    /// Resolve, persist, reload and stage the mapping, then compare with `dest`.
    fn check_prediction(&self, source: &Path, dest: &Path, ctx: &CaseContext<'_>) -> Result<()> {
        let mapping = self.rules.resolve(source)?;
        println!(
            "  Resolved {} file(s), {} excluded",
            mapping.included().len(),
            mapping.excluded().len()
        );

        let saved = ctx.scratch.file("mapping.toml");
        mapping.save(&saved)?;
        let replayed = MappingSpec::load(&saved)?.rule_set().resolve(source)?;
        if replayed != mapping {
            bail!("Mapping reloaded from {} resolves differently", saved.display());
        }

        let staged = ctx.scratch.dir("staged")?;
        replayed.materialize(source, &staged)?;
        verify(dest, &staged, Stage::Prediction)
    }
}

impl TestCase for BuildImage {
    fn name(&self) -> &str {
        "BuildImage"
    }

    fn set_up(&self, dir: &Path) -> Result<()> {
        let source = dir.join("source");
        let dest = dir.join("dest");
        fs::create_dir_all(source.join("src"))?;
        fs::create_dir_all(&dest)?;

        for (src, image, content) in FILES {
            write_file_with_dirs(source.join(src), content)?;
            if let Some(image) = image {
                write_file_with_dirs(dest.join(image), content)?;
            }
        }
        Ok(())
    }

    fn run(&self, dir: &Path, ctx: &CaseContext<'_>) -> Result<()> {
        let source = dir.join("source");
        let dest = dir.join("dest");
        let options = Self::options();
        let oracle = RoundTripOracle::new(ctx.scratch);

        self.check_prediction(&source, &dest, ctx)?;

        let image = ctx.scratch.file("rules.iso");
        ctx.tools
            .build_image
            .run(&source, &image, &options)
            .context("Failed to build image from map rules")?;
        oracle.check_unpack(&dest, &image, &ctx.tools.unpack)?;

        let spec_file = ctx.scratch.file("xdvdfs.toml");
        ctx.tools
            .image_spec
            .run(&source, &spec_file, &options)
            .context("Failed to emit image spec")?;

        let image = ctx.scratch.file("spec.iso");
        let spec_options = vec!["-f".to_string(), spec_file.display().to_string()];
        ctx.tools
            .build_image
            .run(&source, &image, &spec_options)
            .context("Failed to build image from image spec")?;
        oracle.check_unpack(&dest, &image, &ctx.tools.unpack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Scratch;
    use crate::config::Config;
    use crate::rules::Disposition;
    use tempfile::TempDir;

    #[test]
    fn declared_tree_matches_rules() {
        let case = BuildImage::new().unwrap();
        for (src, image, _) in FILES {
            match case.rules().disposition(src) {
                Disposition::Included { dest, .. } => assert_eq!(Some(dest.as_str()), image, "{src}"),
                Disposition::Excluded { .. } => assert_eq!(image, None, "{src}"),
            }
        }
    }

    #[test]
    fn prediction_stage_passes_on_fixture() {
        let case = BuildImage::new().unwrap();
        let temp = TempDir::new().unwrap();
        case.set_up(temp.path()).unwrap();

        let scratch = Scratch::new().unwrap();
        let config = Config::from_vars(|_| None).unwrap();
        let ctx = CaseContext {
            tools: &config.toolchain,
            scratch: &scratch,
        };
        case.check_prediction(&temp.path().join("source"), &temp.path().join("dest"), &ctx)
            .unwrap();
    }

    #[test]
    fn options_interleave_map_flags() {
        let options = BuildImage::options();
        assert_eq!(options.len(), RULES.len() * 2);
        assert_eq!(options[0], "-m");
        assert_eq!(options[1], "bin:/");
    }
}
