//! Recursive directory comparison.
//!
//! Entries are compared by exact name (no case folding, no Unicode
//! normalisation) and regular files by content bytes. The result keeps one
//! level per directory so a mismatch can be reported in full.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Two files with the same name and different content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDiff {
    pub name: OsString,
    pub left_len: u64,
    pub right_len: u64,
    pub left_sha256: String,
    pub right_sha256: String,
}

/// Comparison of one directory pair and, recursively, its common subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirComparison {
    pub left: PathBuf,
    pub right: PathBuf,
    pub left_only: Vec<OsString>,
    pub right_only: Vec<OsString>,
    pub same_files: Vec<OsString>,
    pub diff_files: Vec<ContentDiff>,
    /// Common names whose types differ or that could not be inspected.
    pub funny: Vec<OsString>,
    pub subdirs: BTreeMap<OsString, DirComparison>,
}

/// Compare two directory trees.
pub fn compare_dirs(left: &Path, right: &Path) -> Result<DirComparison> {
    let left_names = list_names(left)?;
    let right_names = list_names(right)?;

    let mut cmp = DirComparison {
        left: left.to_path_buf(),
        right: right.to_path_buf(),
        left_only: left_names.difference(&right_names).cloned().collect(),
        right_only: right_names.difference(&left_names).cloned().collect(),
        same_files: Vec::new(),
        diff_files: Vec::new(),
        funny: Vec::new(),
        subdirs: BTreeMap::new(),
    };

    for name in left_names.intersection(&right_names) {
        let l = left.join(name);
        let r = right.join(name);
        let (Ok(lm), Ok(rm)) = (fs::metadata(&l), fs::metadata(&r)) else {
            cmp.funny.push(name.clone());
            continue;
        };

        if lm.is_dir() && rm.is_dir() {
            cmp.subdirs.insert(name.clone(), compare_dirs(&l, &r)?);
        } else if lm.is_file() && rm.is_file() {
            match compare_files(&l, &r) {
                Ok(None) => cmp.same_files.push(name.clone()),
                Ok(Some(mut diff)) => {
                    diff.name = name.clone();
                    cmp.diff_files.push(diff);
                }
                Err(_) => cmp.funny.push(name.clone()),
            }
        } else {
            cmp.funny.push(name.clone());
        }
    }

    Ok(cmp)
}

fn list_names(dir: &Path) -> Result<BTreeSet<OsString>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        names.insert(entry.file_name());
    }
    Ok(names)
}

fn compare_files(left: &Path, right: &Path) -> std::io::Result<Option<ContentDiff>> {
    let l = fs::read(left)?;
    let r = fs::read(right)?;
    if l == r {
        return Ok(None);
    }
    Ok(Some(ContentDiff {
        name: OsString::new(),
        left_len: l.len() as u64,
        right_len: r.len() as u64,
        left_sha256: sha256_hex(&l),
        right_sha256: sha256_hex(&r),
    }))
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn names(list: &[OsString]) -> String {
    let quoted: Vec<String> = list
        .iter()
        .map(|n| format!("'{}'", n.to_string_lossy()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

impl DirComparison {
    /// True when this level and every subdirectory level have no differences.
    pub fn is_clean(&self) -> bool {
        self.left_only.is_empty()
            && self.right_only.is_empty()
            && self.diff_files.is_empty()
            && self.funny.is_empty()
            && self.subdirs.values().all(DirComparison::is_clean)
    }

    /// Every difference in the tree as `kind: relative/path` lines.
    pub fn differences(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_differences(Path::new(""), &mut out);
        out
    }

    fn collect_differences(&self, prefix: &Path, out: &mut Vec<String>) {
        for name in &self.left_only {
            out.push(format!("only in left: {}", prefix.join(name).display()));
        }
        for name in &self.right_only {
            out.push(format!("only in right: {}", prefix.join(name).display()));
        }
        for diff in &self.diff_files {
            out.push(format!(
                "content differs: {} ({} bytes sha256 {} vs {} bytes sha256 {})",
                prefix.join(&diff.name).display(),
                diff.left_len,
                diff.left_sha256,
                diff.right_len,
                diff.right_sha256
            ));
        }
        for name in &self.funny {
            out.push(format!("type mismatch or unreadable: {}", prefix.join(name).display()));
        }
        for (name, sub) in &self.subdirs {
            sub.collect_differences(&prefix.join(name), out);
        }
    }

    /// Full report of this level and all subdirectories, in `diff` style.
    pub fn report(&self) -> String {
        let mut out = String::new();
        self.write_report(&mut out);
        out
    }

    fn write_report(&self, out: &mut String) {
        let _ = writeln!(out, "diff {} {}", self.left.display(), self.right.display());
        if !self.left_only.is_empty() {
            let _ = writeln!(out, "Only in {} : {}", self.left.display(), names(&self.left_only));
        }
        if !self.right_only.is_empty() {
            let _ = writeln!(out, "Only in {} : {}", self.right.display(), names(&self.right_only));
        }
        if !self.same_files.is_empty() {
            let _ = writeln!(out, "Identical files : {}", names(&self.same_files));
        }
        if !self.diff_files.is_empty() {
            let differing: Vec<OsString> = self.diff_files.iter().map(|d| d.name.clone()).collect();
            let _ = writeln!(out, "Differing files : {}", names(&differing));
        }
        if !self.funny.is_empty() {
            let _ = writeln!(out, "Common funny cases : {}", names(&self.funny));
        }
        for sub in self.subdirs.values() {
            out.push('\n');
            sub.write_report(out);
        }
    }
}
