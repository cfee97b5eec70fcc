//! Preflight command - checks the configured image tools.

use anyhow::Result;

use imgcheck::config::Config;
use imgcheck::preflight;

/// Execute the preflight command.
pub fn cmd_preflight(config: &Config, strict: bool) -> Result<()> {
    if strict {
        preflight::run_preflight_or_fail(&config.toolchain)?;
    } else {
        let report = preflight::run_preflight(&config.toolchain);
        report.print();
        if !report.all_passed() {
            println!("Some checks failed. Use --strict to fail with a non-zero exit code.");
        }
    }
    Ok(())
}
