//! Run command - executes the built-in test cases.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use imgcheck::cases::builtin_cases;
use imgcheck::config::{Config, Toolchain};
use imgcheck::process::CommandTemplate;
use imgcheck::runner::{RunOptions, Runner};

/// Per-run command overrides. Each takes a whole command line.
#[derive(Args, Debug, Default)]
pub struct ToolOverrides {
    /// Command to pack a directory, e.g. "xdvdfs pack {input} {output}"
    #[arg(short = 'p', long)]
    pub pack: Option<CommandTemplate>,
    /// Command to unpack an image
    #[arg(short = 'u', long)]
    pub unpack: Option<CommandTemplate>,
    /// Command to repack an image
    #[arg(short = 'r', long)]
    pub repack: Option<CommandTemplate>,
    /// Command to build an image from map rules ({options} receives -m/-f)
    #[arg(long)]
    pub build_image: Option<CommandTemplate>,
    /// Command to write an image spec file ({options} receives -m)
    #[arg(long)]
    pub image_spec: Option<CommandTemplate>,
    /// Command to copy one path out of an image ({options} receives the path)
    #[arg(long)]
    pub copy_out: Option<CommandTemplate>,
}

impl ToolOverrides {
    pub fn apply(self, tools: &mut Toolchain) {
        let slots = [
            (self.pack, &mut tools.pack),
            (self.unpack, &mut tools.unpack),
            (self.repack, &mut tools.repack),
            (self.build_image, &mut tools.build_image),
            (self.image_spec, &mut tools.image_spec),
            (self.copy_out, &mut tools.copy_out),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Execute the run command. Exit code 1 means at least one case failed.
pub fn cmd_run(config: &Config, overrides: ToolOverrides, options: RunOptions, json: bool) -> Result<ExitCode> {
    let mut tools = config.toolchain.clone();
    overrides.apply(&mut tools);

    let cases = builtin_cases()?;
    let report = Runner::new(tools, options).run(&cases)?;

    println!();
    report.print();
    if json {
        println!("{}", report.to_json()?);
    }

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
