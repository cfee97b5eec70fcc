//! imgcheck - verification harness for XDVDFS image tools.
//!
//! Resolves map rules into concrete image layouts and proves that the
//! external pack/unpack/repack/copy-out tools round-trip directory trees
//! exactly.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use imgcheck::config::Config;
use imgcheck::runner::RunOptions;

#[derive(Parser)]
#[command(name = "imgcheck")]
#[command(about = "Map-rule resolver and round-trip checker for XDVDFS image tools")]
#[command(
    after_help = "QUICK START:\n  imgcheck preflight        Check the configured image tools\n  imgcheck run              Run every built-in test case\n  imgcheck resolve -m bin:/ DIR   Show where files would land in the image"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RuleArgs {
    /// Single map rule, of the form "host/path:image/path" or "!excluded/host/path"
    #[arg(short = 'm', long = "map")]
    map_rules: Vec<String>,

    /// Path to image spec file
    #[arg(short = 'f', long = "file", conflicts_with = "map_rules")]
    image_spec: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in test cases against the configured tools
    Run {
        #[command(flatten)]
        tools: commands::ToolOverrides,

        /// Only run this case (repeatable)
        #[arg(long = "case")]
        cases: Vec<String>,

        /// Stop after the first failing case
        #[arg(long)]
        fail_fast: bool,

        /// Also print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show where each source file would land in the image
    Resolve {
        #[command(flatten)]
        rules: RuleArgs,

        /// Write the resolved mapping to this file
        #[arg(long)]
        mapping_out: Option<PathBuf>,

        /// Source directory
        source: PathBuf,
    },

    /// Manage image spec `xdvdfs.toml` files
    ImageSpec {
        #[command(subcommand)]
        command: ImageSpecCommand,
    },

    /// Copy the mapped files into a directory laid out like the image
    Stage {
        #[command(flatten)]
        rules: RuleArgs,

        /// Use a mapping written by `resolve --mapping-out` instead of rules
        #[arg(long, conflicts_with_all = ["map_rules", "image_spec"])]
        mapping: Option<PathBuf>,

        /// Source directory
        source: PathBuf,

        /// Output directory
        dest: PathBuf,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Run preflight checks (verify the image tools can be found)
    Preflight {
        /// Fail if any checks fail
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ImageSpecCommand {
    /// Generate an `xdvdfs.toml` file from map rules
    From {
        /// Single map rule, of the form "host/path:image/path" or "!excluded/host/path"
        #[arg(short = 'm', long = "map")]
        map_rules: Vec<String>,

        /// Relative path to the resulting image output file
        #[arg(short = 'O', long = "output")]
        meta_output: Option<String>,

        /// Path to output file. Output to stdout if not provided
        output_file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// List the built-in test cases
    Cases,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Run {
            tools,
            cases,
            fail_fast,
            json,
        } => {
            let config = Config::load()?;
            let options = RunOptions {
                filter: cases,
                fail_fast,
            };
            return commands::cmd_run(&config, tools, options, json);
        }

        Commands::Resolve {
            rules,
            mapping_out,
            source,
        } => {
            let rules = commands::load_rules(&rules.map_rules, rules.image_spec.as_deref(), &source)?;
            commands::cmd_resolve(&rules, &source, mapping_out.as_deref())?;
        }

        Commands::ImageSpec {
            command:
                ImageSpecCommand::From {
                    map_rules,
                    meta_output,
                    output_file,
                },
        } => {
            commands::cmd_image_spec_from(&map_rules, meta_output, output_file.as_deref())?;
        }

        Commands::Stage {
            rules,
            mapping,
            source,
            dest,
        } => {
            let input = match &mapping {
                Some(path) => commands::StageInput::Mapping(path),
                None => commands::StageInput::Rules(commands::load_rules(
                    &rules.map_rules,
                    rules.image_spec.as_deref(),
                    &source,
                )?),
            };
            commands::cmd_stage(input, &source, &dest)?;
        }

        Commands::Show { what } => {
            let config = Config::load()?;
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Cases => commands::show::ShowTarget::Cases,
            };
            commands::cmd_show(show_target, &config)?;
        }

        Commands::Preflight { strict } => {
            let config = Config::load()?;
            commands::cmd_preflight(&config, strict)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
