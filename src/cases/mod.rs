//! Built-in test cases.
//!
//! Every case has two phases. `set_up` writes a fixture tree into a fresh
//! directory, then `run` drives the external tools against it. The set of
//! case kinds is closed; [`Case`] is the one type the runner deals with.

mod build_image;
mod copy_out;
mod exiso;
pub mod fixture;
mod pack;

pub use build_image::BuildImage;
pub use copy_out::CopyOut;
pub use exiso::ExtractXisoCompat;
pub use pack::{PackCase, PackFixture};

use anyhow::Result;
use std::path::Path;

use crate::common::Scratch;
use crate::config::Toolchain;

/// What a case gets to work with while running.
pub struct CaseContext<'a> {
    pub tools: &'a Toolchain,
    /// Private to this case and removed when it finishes.
    pub scratch: &'a Scratch,
}

pub trait TestCase {
    fn name(&self) -> &str;

    /// Populate the empty fixture directory `dir`.
    fn set_up(&self, dir: &Path) -> Result<()>;

    /// Verify the tools against the fixture in `dir`.
    fn run(&self, dir: &Path, ctx: &CaseContext<'_>) -> Result<()>;
}

pub enum Case {
    Pack(PackCase),
    CopyOut(CopyOut),
    BuildImage(BuildImage),
    ExtractXisoCompat(ExtractXisoCompat),
}

impl Case {
    fn inner(&self) -> &dyn TestCase {
        match self {
            Case::Pack(c) => c,
            Case::CopyOut(c) => c,
            Case::BuildImage(c) => c,
            Case::ExtractXisoCompat(c) => c,
        }
    }
}

impl TestCase for Case {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn set_up(&self, dir: &Path) -> Result<()> {
        self.inner().set_up(dir)
    }

    fn run(&self, dir: &Path, ctx: &CaseContext<'_>) -> Result<()> {
        self.inner().run(dir, ctx)
    }
}

/// Every built-in case, in run order.
///
/// Fails only if a case's own rules do not compile.
pub fn builtin_cases() -> Result<Vec<Case>> {
    let mut cases: Vec<Case> = PackFixture::ALL
        .iter()
        .map(|f| Case::Pack(PackCase::new(*f)))
        .collect();
    cases.push(Case::CopyOut(CopyOut));
    cases.push(Case::BuildImage(BuildImage::new()?));
    cases.push(Case::ExtractXisoCompat(ExtractXisoCompat));
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_names_are_unique() {
        let cases = builtin_cases().unwrap();
        let names: HashSet<&str> = cases.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), cases.len());
        assert!(names.contains("BuildImage"));
        assert!(names.contains("DirentSize2048"));
    }
}
