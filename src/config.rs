//! Configuration management for imgcheck.
//!
//! Reads the external tool command lines from a .env file and environment
//! variables. Environment variables take precedence over .env, and
//! command-line flags take precedence over both.

use anyhow::{Context, Result};

use crate::process::CommandTemplate;

/// Program used by every default command line.
pub const DEFAULT_TOOL: &str = "xdvdfs";

/// Commands for the externally-compatible extract-xiso interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExisoToolchain {
    pub pack: CommandTemplate,
    /// Unpack with `-x` (extract without creating a directory named after the image).
    pub unpack_x: CommandTemplate,
    pub unpack_plain: CommandTemplate,
    /// Rewrites `{input}` in place.
    pub repack_in_place: CommandTemplate,
}

/// Every external tool the test cases invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub pack: CommandTemplate,
    pub unpack: CommandTemplate,
    pub repack: CommandTemplate,
    pub build_image: CommandTemplate,
    pub image_spec: CommandTemplate,
    pub copy_out: CommandTemplate,
    pub exiso: ExisoToolchain,
}

/// imgcheck configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub toolchain: Toolchain,
}

// (variable, default arguments after the tool name)
const PACK: (&str, &str) = ("IMGCHECK_PACK_CMD", "pack {input} {output}");
const UNPACK: (&str, &str) = ("IMGCHECK_UNPACK_CMD", "unpack {input} {output}");
const REPACK: (&str, &str) = ("IMGCHECK_REPACK_CMD", "pack {input} {output}");
const BUILD_IMAGE: (&str, &str) = (
    "IMGCHECK_BUILD_IMAGE_CMD",
    "build-image {options} {input} {output}",
);
const IMAGE_SPEC: (&str, &str) = ("IMGCHECK_IMAGE_SPEC_CMD", "image-spec from {options} {output}");
const COPY_OUT: (&str, &str) = ("IMGCHECK_COPY_OUT_CMD", "copy-out {input} {options} {output}");
const EXISO_PACK: (&str, &str) = ("IMGCHECK_EXISO_PACK_CMD", "extract-xiso -c {input} {output}");
const EXISO_UNPACK_X: (&str, &str) = (
    "IMGCHECK_EXISO_UNPACK_X_CMD",
    "extract-xiso -d {output} -x {input}",
);
const EXISO_UNPACK: (&str, &str) = ("IMGCHECK_EXISO_UNPACK_CMD", "extract-xiso -d {output} {input}");
const EXISO_REPACK: (&str, &str) = ("IMGCHECK_EXISO_REPACK_CMD", "extract-xiso -D -r {input}");

impl Config {
    /// Load configuration from .env and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `IMGCHECK_TOOL` changes the program used by the defaults; each
    /// `IMGCHECK_*_CMD` replaces one whole command line.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let tool = lookup("IMGCHECK_TOOL").unwrap_or_else(|| DEFAULT_TOOL.to_string());

        let command = |(key, default): (&str, &str)| -> Result<CommandTemplate> {
            let line = lookup(key).unwrap_or_else(|| format!("{tool} {default}"));
            CommandTemplate::parse(&line).with_context(|| format!("Invalid {key}"))
        };

        Ok(Self {
            toolchain: Toolchain {
                pack: command(PACK)?,
                unpack: command(UNPACK)?,
                repack: command(REPACK)?,
                build_image: command(BUILD_IMAGE)?,
                image_spec: command(IMAGE_SPEC)?,
                copy_out: command(COPY_OUT)?,
                exiso: ExisoToolchain {
                    pack: command(EXISO_PACK)?,
                    unpack_x: command(EXISO_UNPACK_X)?,
                    unpack_plain: command(EXISO_UNPACK)?,
                    repack_in_place: command(EXISO_REPACK)?,
                },
            },
        })
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        let t = &self.toolchain;
        println!("Configuration:");
        println!("  {}: {}", PACK.0, t.pack);
        println!("  {}: {}", UNPACK.0, t.unpack);
        println!("  {}: {}", REPACK.0, t.repack);
        println!("  {}: {}", BUILD_IMAGE.0, t.build_image);
        println!("  {}: {}", IMAGE_SPEC.0, t.image_spec);
        println!("  {}: {}", COPY_OUT.0, t.copy_out);
        println!("  {}: {}", EXISO_PACK.0, t.exiso.pack);
        println!("  {}: {}", EXISO_UNPACK_X.0, t.exiso.unpack_x);
        println!("  {}: {}", EXISO_UNPACK.0, t.exiso.unpack_plain);
        println!("  {}: {}", EXISO_REPACK.0, t.exiso.repack_in_place);
    }
}
