//! Show command - displays information.

use anyhow::Result;

use imgcheck::cases::{builtin_cases, TestCase};
use imgcheck::config::Config;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show the effective tool configuration
    Config,
    /// List the built-in test cases
    Cases,
}

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => config.print(),
        ShowTarget::Cases => {
            for case in builtin_cases()? {
                println!("{}", case.name());
            }
        }
    }
    Ok(())
}
