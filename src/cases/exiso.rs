//! The extract-xiso compatible interface must round-trip like the native one.

use anyhow::{Context, Result};
use std::path::Path;

use super::fixture::file_names;
use super::{CaseContext, TestCase};
use crate::common::write_file_with_dirs;
use crate::oracle::RoundTripOracle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractXisoCompat;

impl TestCase for ExtractXisoCompat {
    fn name(&self) -> &str {
        "ExtractXisoCompat"
    }

    fn set_up(&self, dir: &Path) -> Result<()> {
        for name in file_names(self.name(), 1) {
            write_file_with_dirs(dir.join(name), "extract-xiso compat")?;
        }
        Ok(())
    }

    fn run(&self, dir: &Path, ctx: &CaseContext<'_>) -> Result<()> {
        let exiso = &ctx.tools.exiso;
        let image = ctx.scratch.file("image.iso");
        exiso
            .pack
            .run(dir, &image, &[])
            .with_context(|| format!("Failed to pack {} with extract-xiso", dir.display()))?;

        let oracle = RoundTripOracle::new(ctx.scratch);
        oracle.check_unpack(dir, &image, &exiso.unpack_x)?;
        oracle.check_unpack(dir, &image, &exiso.unpack_plain)?;

        // extract-xiso cannot name its repack output; it always rewrites the input.
        oracle.check_repack_in_place(dir, &image, &exiso.repack_in_place, &exiso.unpack_x)
    }
}
