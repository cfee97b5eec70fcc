//! Round-trip fidelity checks.
//!
//! Given a reference tree and an image built from it, the oracle drives the
//! external unpack/repack/copy-out tools and proves that what comes back out
//! of the image is exactly the reference tree:
//!
//! 1. `unpack(image)` must equal the reference.
//! 2. `unpack(repack(image))` must equal the reference, including when the
//!    repack rewrites the image in place.
//! 3. Copying single paths out of the image must reproduce those paths.

pub mod compare;

pub use compare::{compare_dirs, ContentDiff, DirComparison};

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

use crate::common::Scratch;
use crate::config::Toolchain;
use crate::process::CommandTemplate;

/// Which check produced a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Resolved mapping against the declared image tree.
    Prediction,
    PackUnpack,
    Repack,
    CopyOut,
}

impl Stage {
    fn describe(self) -> &'static str {
        match self {
            Stage::Prediction => "Mismatch between declared image tree and resolved mapping",
            Stage::PackUnpack => "Mismatch between test case input and packed output",
            Stage::Repack => "Mismatch between test case input and repacked output",
            Stage::CopyOut => "Mismatch between test case input and copied-out output",
        }
    }
}

/// A tree comparison that was not clean.
#[derive(Debug, Clone)]
pub struct ComparisonMismatch {
    pub stage: Stage,
    pub comparison: DirComparison,
}

impl fmt::Display for ComparisonMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage.describe())?;
        for line in self.comparison.differences() {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ComparisonMismatch {}

/// Fail with a [`ComparisonMismatch`] unless `left` and `right` are identical trees.
pub fn verify(left: &Path, right: &Path, stage: Stage) -> Result<()> {
    let comparison = compare_dirs(left, right)?;
    if comparison.is_clean() {
        return Ok(());
    }
    Err(ComparisonMismatch { stage, comparison }.into())
}

/// Runs round-trip checks, keeping all intermediate images and trees in one scratch area.
pub struct RoundTripOracle<'a> {
    scratch: &'a Scratch,
}

impl<'a> RoundTripOracle<'a> {
    pub fn new(scratch: &'a Scratch) -> Self {
        Self { scratch }
    }

    /// Unpack `image` and compare with `expected`.
    pub fn check_unpack(&self, expected: &Path, image: &Path, unpack: &CommandTemplate) -> Result<()> {
        let out = self.scratch.dir("unpacked")?;
        unpack
            .run(image, &out, &[])
            .with_context(|| format!("Failed to unpack {}", image.display()))?;
        verify(expected, &out, Stage::PackUnpack)
    }

    /// Repack `image` into a new image, unpack that, and compare with `expected`.
    pub fn check_repack(
        &self,
        expected: &Path,
        image: &Path,
        repack: &CommandTemplate,
        unpack: &CommandTemplate,
    ) -> Result<()> {
        let repacked = self.scratch.file("repacked.iso");
        repack
            .run(image, &repacked, &[])
            .with_context(|| format!("Failed to repack {}", image.display()))?;
        self.unpack_and_verify(expected, &repacked, unpack, Stage::Repack)
    }

    /// Repack `image` onto itself, unpack it, and compare with `expected`.
    pub fn check_repack_in_place(
        &self,
        expected: &Path,
        image: &Path,
        repack: &CommandTemplate,
        unpack: &CommandTemplate,
    ) -> Result<()> {
        repack
            .run(image, image, &[])
            .with_context(|| format!("Failed to repack {} in place", image.display()))?;
        self.unpack_and_verify(expected, image, unpack, Stage::Repack)
    }

    fn unpack_and_verify(
        &self,
        expected: &Path,
        image: &Path,
        unpack: &CommandTemplate,
        stage: Stage,
    ) -> Result<()> {
        let out = self.scratch.dir("repacked-unpacked")?;
        unpack
            .run(image, &out, &[])
            .with_context(|| format!("Failed to unpack {}", image.display()))?;
        verify(expected, &out, stage)
    }

    /// Both round trips: `pack -> unpack` and `pack -> repack -> unpack`.
    pub fn check_round_trip(&self, expected: &Path, image: &Path, tools: &Toolchain) -> Result<()> {
        self.check_unpack(expected, image, &tools.unpack)?;
        self.check_repack(expected, image, &tools.repack, &tools.unpack)
    }

    /// Copy each image path out of `image` and compare the result with `expected`.
    ///
    /// `paths` are absolute image paths such as `/b`; together they should
    /// cover the whole of `expected`.
    pub fn check_copy_out(
        &self,
        expected: &Path,
        image: &Path,
        copy_out: &CommandTemplate,
        paths: &[&str],
    ) -> Result<()> {
        let out = self.scratch.dir("copy-out")?;
        for path in paths {
            let target = out.join(path.trim_start_matches('/'));
            copy_out
                .run(image, &target, &[path.to_string()])
                .with_context(|| format!("Failed to copy {} out of {}", path, image.display()))?;
        }
        verify(expected, &out, Stage::CopyOut)
    }
}
