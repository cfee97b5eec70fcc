//! Plain pack/unpack cases: pack a raw tree, then check both round trips.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::fixture::{file_names, FILE_BYTE_COUNT};
use super::{CaseContext, TestCase};
use crate::common::write_file_with_dirs;
use crate::oracle::RoundTripOracle;

/// Fixture trees for the plain pack cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackFixture {
    EmptyRoot,
    EmptyFile,
    EmptySubdir,
    /// Names that only differ by case or accent.
    SpecialCharsInName,
    /// One directory whose entries fill exactly one 2048-byte sector.
    DirentSize2048,
    /// One directory whose entries overflow a 64 KiB offset.
    ManyFiles,
}

impl PackFixture {
    pub const ALL: [PackFixture; 6] = [
        PackFixture::EmptyRoot,
        PackFixture::EmptyFile,
        PackFixture::EmptySubdir,
        PackFixture::SpecialCharsInName,
        PackFixture::DirentSize2048,
        PackFixture::ManyFiles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PackFixture::EmptyRoot => "EmptyRoot",
            PackFixture::EmptyFile => "EmptyFile",
            PackFixture::EmptySubdir => "EmptySubdir",
            PackFixture::SpecialCharsInName => "SpecialCharsInName",
            PackFixture::DirentSize2048 => "DirentSize2048",
            PackFixture::ManyFiles => "ManyFiles",
        }
    }

    /// Write the fixture tree into `dir`.
    pub fn write(self, dir: &Path) -> Result<()> {
        match self {
            PackFixture::EmptyRoot => {}
            PackFixture::EmptyFile => write_file_with_dirs(dir.join("empty_file"), "")?,
            PackFixture::EmptySubdir => fs::create_dir(dir.join("subdir"))?,
            PackFixture::SpecialCharsInName => {
                for name in ["Ü", "b", "ü", "á"] {
                    write_file_with_dirs(dir.join(name), name)?;
                }
            }
            PackFixture::DirentSize2048 => {
                write_file_with_dirs(dir.join("b"), "data")?;
                write_many(dir, self.name(), 2048 / FILE_BYTE_COUNT)?;
            }
            PackFixture::ManyFiles => {
                write_many(dir, self.name(), 65536 / FILE_BYTE_COUNT + 1)?;
            }
        }
        Ok(())
    }
}

fn write_many(dir: &Path, seed: &str, count: usize) -> Result<()> {
    let a = dir.join("a");
    fs::create_dir_all(&a)?;
    for name in file_names(seed, count) {
        fs::write(a.join(&name), "data").with_context(|| format!("Failed to write a/{name}"))?;
    }
    Ok(())
}

/// Pack the fixture, then check `unpack` and `repack -> unpack` against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackCase {
    fixture: PackFixture,
}

impl PackCase {
    pub fn new(fixture: PackFixture) -> Self {
        Self { fixture }
    }
}

impl TestCase for PackCase {
    fn name(&self) -> &str {
        self.fixture.name()
    }

    fn set_up(&self, dir: &Path) -> Result<()> {
        self.fixture.write(dir)
    }

    fn run(&self, dir: &Path, ctx: &CaseContext<'_>) -> Result<()> {
        let image = ctx.scratch.file("image.iso");
        ctx.tools
            .pack
            .run(dir, &image, &[])
            .with_context(|| format!("Failed to pack {}", dir.display()))?;

        RoundTripOracle::new(ctx.scratch).check_round_trip(dir, &image, ctx.tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::list_source_files;
    use tempfile::TempDir;

    fn written(fixture: PackFixture) -> TempDir {
        let temp = TempDir::new().unwrap();
        fixture.write(temp.path()).unwrap();
        temp
    }

    #[test]
    fn dirent_fixture_has_one_sector_of_entries() {
        let temp = written(PackFixture::DirentSize2048);
        let names = fs::read_dir(temp.path().join("a")).unwrap().count();
        assert_eq!(names * FILE_BYTE_COUNT, 2048);
        assert_eq!(fs::read_to_string(temp.path().join("b")).unwrap(), "data");
    }

    #[test]
    fn many_files_crosses_64k() {
        let temp = written(PackFixture::ManyFiles);
        let names = fs::read_dir(temp.path().join("a")).unwrap().count();
        assert_eq!(names, 2049);
        assert!(names * FILE_BYTE_COUNT > 65536);
    }

    #[test]
    fn special_char_files_contain_their_names() {
        let temp = written(PackFixture::SpecialCharsInName);
        assert_eq!(list_source_files(temp.path()).unwrap().len(), 4);
        assert_eq!(fs::read_to_string(temp.path().join("ü")).unwrap(), "ü");
    }

    #[test]
    fn empty_fixtures() {
        assert!(fs::read_dir(written(PackFixture::EmptyRoot).path()).unwrap().next().is_none());
        assert!(written(PackFixture::EmptySubdir).path().join("subdir").is_dir());
        let temp = written(PackFixture::EmptyFile);
        assert_eq!(fs::metadata(temp.path().join("empty_file")).unwrap().len(), 0);
    }
}
