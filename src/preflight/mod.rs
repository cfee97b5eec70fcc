//! Preflight checks for imgcheck.
//!
//! Validates that every configured image tool can be found before running
//! the test cases. Run with `imgcheck preflight`.

mod host_tools;
mod types;

use anyhow::{bail, Result};

use crate::config::Toolchain;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(toolchain: &Toolchain) -> PreflightReport {
    println!("Checking image tools...");
    let checks = host_tools::check_toolchain(toolchain);
    println!();

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(toolchain: &Toolchain) -> Result<()> {
    let report = run_preflight(toolchain);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before running.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
