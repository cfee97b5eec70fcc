//! Resolving a rule set against a source tree.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::ResolveError;
use super::{Disposition, RuleSet};
use crate::mapping::{MappedFile, MappingSpec};

/// Every regular file under `root`, as sorted `/`-separated relative paths.
///
/// Directories are not listed; an empty directory contributes nothing.
pub fn list_source_files(root: &Path) -> Result<Vec<String>, ResolveError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            ResolveError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        files.push(relative_path(root, entry.path())?);
    }

    files.sort();
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Result<String, ResolveError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in rel.components() {
        let Some(part) = component.as_os_str().to_str() else {
            return Err(ResolveError::NonUtf8Path(PathBuf::from(path)));
        };
        parts.push(part);
    }
    Ok(parts.join("/"))
}

impl RuleSet {
    /// Resolve every file under `root` into a mapping.
    pub fn resolve(&self, root: &Path) -> Result<MappingSpec, ResolveError> {
        self.resolve_files(list_source_files(root)?)
    }

    /// Resolve an explicit list of relative file paths.
    pub fn resolve_files<I, S>(&self, files: I) -> Result<MappingSpec, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut included = Vec::new();
        let mut excluded = Vec::new();

        for file in files {
            let file = file.as_ref();
            match self.disposition(file) {
                Disposition::Included { dest, rule } => {
                    if dest.is_empty() {
                        return Err(ResolveError::EmptyDestination {
                            source_path: file.to_owned(),
                            rule: rule.text().to_owned(),
                        });
                    }
                    included.push(MappedFile {
                        source: file.to_owned(),
                        dest,
                    });
                }
                Disposition::Excluded { .. } => excluded.push(file.to_owned()),
            }
        }

        MappingSpec::new(included, excluded)
    }
}
