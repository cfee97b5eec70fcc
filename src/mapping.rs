//! Resolved mappings: concrete source -> image path pairs.
//!
//! A `MappingSpec` is what resolving a rule set over a source tree produces.
//! It can be written to disk and loaded back, and building from it must give
//! the same image as building from the rules that produced it.
//!
//! ```toml
//! excluded = ["a/excluded"]
//!
//! [[map]]
//! source = "bin/default.xbe"
//! dest = "default.xbe"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::rules::{normalize_image_path, ResolveError, Rule, RuleSet};

/// One included file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappedFile {
    pub source: String,
    pub dest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingSpec {
    excluded: Vec<String>,
    #[serde(rename = "map")]
    included: Vec<MappedFile>,
}

/// On-disk form, validated by [`MappingSpec::new`] before use.
#[derive(Deserialize)]
struct StoredMapping {
    #[serde(default)]
    excluded: Vec<String>,
    #[serde(rename = "map", default)]
    included: Vec<MappedFile>,
}

impl MappingSpec {
    /// Build a validated mapping. Both lists are sorted by source path.
    ///
    /// Image paths are normalised to be relative to the image root; one that
    /// is empty or climbs out of the root with `..` is an error.
    pub fn new(included: Vec<MappedFile>, mut excluded: Vec<String>) -> Result<Self, ResolveError> {
        let mut included = included
            .into_iter()
            .map(checked_dest)
            .collect::<Result<Vec<_>, _>>()?;
        included.sort();
        excluded.sort();
        excluded.dedup();
        check_layout(&included)?;
        Ok(Self { excluded, included })
    }

    pub fn included(&self) -> &[MappedFile] {
        &self.included
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn dest_of(&self, source: &str) -> Option<&str> {
        self.included
            .binary_search_by(|m| m.source.as_str().cmp(source))
            .ok()
            .map(|i| self.included[i].dest.as_str())
    }

    pub fn is_excluded(&self, source: &str) -> bool {
        self.excluded.binary_search_by(|s| s.as_str().cmp(source)).is_ok()
    }

    /// Exact-literal rules that reproduce this mapping's inclusions.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(
            self.included
                .iter()
                .map(|m| Rule::literal(&m.source, &m.dest))
                .collect(),
        )
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize mapping")
    }

    /// Parse and re-validate a persisted mapping.
    pub fn from_toml(text: &str) -> Result<Self> {
        let raw: StoredMapping = toml::from_str(text).context("Failed to parse mapping")?;
        Ok(Self::new(raw.included, raw.excluded)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::common::write_file_with_dirs(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid mapping in {}", path.display()))
    }

    /// Copy every included file from `source_root` to its image path under `dest_root`.
    ///
    /// `dest_root` is created if missing. Excluded files are not touched.
    pub fn materialize(&self, source_root: &Path, dest_root: &Path) -> Result<()> {
        fs::create_dir_all(dest_root)
            .with_context(|| format!("Failed to create {}", dest_root.display()))?;

        for file in &self.included {
            let from = source_root.join(&file.source);
            let to = dest_root.join(&file.dest);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&from, &to).with_context(|| {
                format!("Failed to copy {} to {}", from.display(), to.display())
            })?;
        }
        Ok(())
    }
}

fn checked_dest(file: MappedFile) -> Result<MappedFile, ResolveError> {
    let dest = normalize_image_path(&file.dest);
    if dest.split('/').any(|part| part == "..") {
        return Err(ResolveError::EscapesImageRoot {
            source_path: file.source,
            dest: file.dest,
        });
    }
    if dest.is_empty() {
        return Err(ResolveError::EmptyDestination {
            rule: format!("{}:{}", file.source, file.dest),
            source_path: file.source,
        });
    }
    Ok(MappedFile {
        source: file.source,
        dest,
    })
}

/// Reject two files on one path, and files that other files need as directories.
fn check_layout(included: &[MappedFile]) -> Result<(), ResolveError> {
    let mut by_dest: Vec<&MappedFile> = included.iter().collect();
    by_dest.sort_by(|a, b| a.dest.cmp(&b.dest));

    for pair in by_dest.windows(2) {
        if pair[0].dest == pair[1].dest {
            return Err(ResolveError::DuplicateDestination {
                dest: pair[0].dest.clone(),
                first: pair[0].source.clone(),
                second: pair[1].source.clone(),
            });
        }
    }

    let dests: BTreeSet<&str> = included.iter().map(|m| m.dest.as_str()).collect();
    for dest in &dests {
        for (i, _) in dest.match_indices('/') {
            let parent = &dest[..i];
            if dests.contains(parent) {
                return Err(ResolveError::FileDirectoryClash {
                    dest: parent.to_owned(),
                    child: (*dest).to_owned(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mapped(source: &str, dest: &str) -> MappedFile {
        MappedFile {
            source: source.into(),
            dest: dest.into(),
        }
    }

    #[test]
    fn sorts_and_looks_up() {
        let spec = MappingSpec::new(
            vec![mapped("b", "x/b"), mapped("a", "a")],
            vec!["z".into(), "c".into()],
        )
        .unwrap();
        assert_eq!(spec.included()[0].source, "a");
        assert_eq!(spec.dest_of("b"), Some("x/b"));
        assert_eq!(spec.dest_of("c"), None);
        assert!(spec.is_excluded("c"));
        assert!(!spec.is_excluded("a"));
    }

    #[test]
    fn toml_round_trip() {
        let spec = MappingSpec::new(
            vec![mapped("bin/default.xbe", "default.xbe")],
            vec!["a/excluded".into()],
        )
        .unwrap();
        let text = spec.to_toml().unwrap();
        assert!(text.contains("[[map]]"));
        assert_eq!(MappingSpec::from_toml(&text).unwrap(), spec);
    }

    #[test]
    fn loading_revalidates() {
        let text = r#"
            [[map]]
            source = "a"
            dest = "x"

            [[map]]
            source = "b"
            dest = "x"
        "#;
        let err = MappingSpec::from_toml(text).unwrap_err();
        assert!(err.downcast_ref::<ResolveError>().is_some());
    }

    #[test]
    fn loaded_destinations_stay_inside_image() {
        let text = r#"
            [[map]]
            source = "a"
            dest = "/abs/a"
        "#;
        let spec = MappingSpec::from_toml(text).unwrap();
        assert_eq!(spec.dest_of("a"), Some("abs/a"));

        let text = r#"
            [[map]]
            source = "a"
            dest = "x/../../a"
        "#;
        let err = MappingSpec::from_toml(text).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::EscapesImageRoot { .. })
        ));
    }

    #[test]
    fn absolute_destination_materializes_under_dest_root() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a"), "a").unwrap();

        let outside = temp.path().join("outside");
        let text = format!(
            "[[map]]\nsource = \"a\"\ndest = \"{}\"\n",
            outside.display()
        );
        let spec = MappingSpec::from_toml(&text).unwrap();
        let dest = temp.path().join("dest");
        spec.materialize(&src, &dest).unwrap();

        assert!(!outside.exists());
        assert!(dest.join(outside.strip_prefix("/").unwrap()).is_file());
    }

    #[test]
    fn literal_rules_reproduce_inclusions() {
        let spec = MappingSpec::new(
            vec![mapped("a/{x}*", "odd/{0}"), mapped("b", "c")],
            vec!["d".into()],
        )
        .unwrap();
        let again = spec.rule_set().resolve_files(["a/{x}*", "b", "d"]).unwrap();
        assert_eq!(again, spec);
    }

    #[test]
    fn materializes_included_files() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("bin")).unwrap();
        fs::write(src.join("bin/app"), "app").unwrap();
        fs::write(src.join("skip"), "skip").unwrap();

        let spec = MappingSpec::new(vec![mapped("bin/app", "deep/app")], vec!["skip".into()]).unwrap();
        let dest = temp.path().join("dest");
        spec.materialize(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("deep/app")).unwrap(), "app");
        assert!(!dest.join("skip").exists());
    }
}
