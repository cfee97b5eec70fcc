//! Copy single files and subtrees out of a packed image.

use anyhow::{Context, Result};
use std::path::Path;

use super::{CaseContext, TestCase};
use crate::common::write_tree;
use crate::oracle::RoundTripOracle;

const FILES: [(&str, &str); 3] = [("b", "root_b"), ("a/f1", "root_a_f1"), ("a/f2", "root_a_f2")];

/// Image paths copied out; together they cover the whole fixture.
const COPIED: [&str; 2] = ["/b", "/a"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOut;

impl TestCase for CopyOut {
    fn name(&self) -> &str {
        "CopyOut"
    }

    fn set_up(&self, dir: &Path) -> Result<()> {
        write_tree(dir, FILES)
    }

    fn run(&self, dir: &Path, ctx: &CaseContext<'_>) -> Result<()> {
        let image = ctx.scratch.file("image.iso");
        ctx.tools
            .pack
            .run(dir, &image, &[])
            .with_context(|| format!("Failed to pack {}", dir.display()))?;

        RoundTripOracle::new(ctx.scratch).check_copy_out(dir, &image, &ctx.tools.copy_out, &COPIED)
    }
}
