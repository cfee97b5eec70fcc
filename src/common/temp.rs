//! Per-case scratch space for images and unpacked trees.

use anyhow::{Context, Result};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that hands out unique paths.
///
/// Everything below it is removed when the `Scratch` is dropped, on success
/// and failure alike.
pub struct Scratch {
    root: TempDir,
    next: Cell<usize>,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("imgcheck-")
            .tempdir()
            .context("Failed to create scratch directory")?;
        Ok(Self {
            root,
            next: Cell::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    fn unique(&self, stem: &str) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{n:03}-{stem}")
    }

    /// A fresh path for a file; nothing is created.
    pub fn file(&self, stem: &str) -> PathBuf {
        self.root.path().join(self.unique(stem))
    }

    /// A fresh, empty directory.
    pub fn dir(&self, stem: &str) -> Result<PathBuf> {
        let dir = self.file(stem);
        fs::create_dir(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_distinct_paths() {
        let scratch = Scratch::new().unwrap();
        let a = scratch.file("image.iso");
        let b = scratch.file("image.iso");
        assert_ne!(a, b);
        assert!(!a.exists());

        let d = scratch.dir("unpacked").unwrap();
        assert!(d.is_dir());
        assert!(d.starts_with(scratch.path()));
    }

    #[test]
    fn removed_on_drop() {
        let scratch = Scratch::new().unwrap();
        let root = scratch.path().to_path_buf();
        fs::write(scratch.file("x"), "x").unwrap();
        drop(scratch);
        assert!(!root.exists());
    }
}
