//! Centralized command execution with consistent error handling.
//!
//! Every external image tool runs through [`Cmd`], so all of them capture
//! stderr and fail with the same [`ExternalToolError`]. Tools are configured
//! as [`CommandTemplate`]s: an argv with `{input}`, `{output}` and
//! `{options}` placeholders.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::str::FromStr;

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// An external tool ran and exited non-zero.
#[derive(Debug, Clone)]
pub struct ExternalToolError {
    pub program: String,
    pub args: Vec<String>,
    /// Exit code, or -1 if terminated by signal.
    pub code: i32,
    pub stderr: String,
}

impl fmt::Display for ExternalToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' failed (exit code {})", self.program, self.code)?;
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ":\n{stderr}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExternalToolError {}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
        }
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Run the command and capture output.
    ///
    /// A non-zero exit is an [`ExternalToolError`].
    pub fn run(self) -> Result<CommandResult> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("Failed to execute '{}'. Is it installed?", self.program))?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            return Err(ExternalToolError {
                program: self.program,
                args: self.args,
                code: result.code(),
                stderr: result.stderr,
            }
            .into());
        }

        Ok(result)
    }
}

/// An external tool invocation with placeholders.
///
/// - `{input}` and `{output}` are replaced anywhere inside an argument.
/// - `{options}` must be a whole argument and expands to zero or more
///   arguments, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    argv: Vec<String>,
}

impl CommandTemplate {
    /// Parse a whitespace-separated command line, e.g. `xdvdfs pack {input} {output}`.
    pub fn parse(line: &str) -> Result<Self> {
        Self::from_argv(line.split_whitespace().map(str::to_owned).collect())
    }

    /// Build from an explicit argv; arguments may contain spaces.
    pub fn from_argv(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            bail!("Command template is empty");
        }
        if let Some(bad) = argv
            .iter()
            .find(|a| a.contains("{options}") && a.as_str() != "{options}")
        {
            bail!("'{{options}}' must be a whole argument, found \"{bad}\"");
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// The argument list for one invocation, program excluded.
    pub fn render(&self, input: &Path, output: &Path, options: &[String]) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();

        let mut args = Vec::new();
        for arg in &self.argv[1..] {
            if arg == "{options}" {
                args.extend(options.iter().cloned());
            } else {
                args.push(
                    arg.replace("{input}", &input)
                        .replace("{output}", &output),
                );
            }
        }
        args
    }

    /// Run the tool to completion.
    pub fn run(&self, input: &Path, output: &Path, options: &[String]) -> Result<CommandResult> {
        Cmd::new(self.program())
            .args(self.render(input, output, options))
            .run()
    }
}

impl FromStr for CommandTemplate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = Cmd::new("echo").args(["hello"]).run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn test_failure_is_external_tool_error() {
        let err = Cmd::new("ls").args(["/nonexistent_path_12345"]).run().unwrap_err();
        let tool = err.downcast_ref::<ExternalToolError>().unwrap();

        assert_eq!(tool.program, "ls");
        assert_ne!(tool.code, 0);
        assert_eq!(tool.args, vec!["/nonexistent_path_12345"]);
        assert!(!tool.stderr.is_empty());
        assert!(err.to_string().contains("No such file") || err.to_string().contains("cannot access"));
    }

    #[test]
    fn test_context_keeps_tool_error() {
        let err = Cmd::new("false")
            .run()
            .context("Repack step failed")
            .unwrap_err();

        assert_eq!(err.to_string(), "Repack step failed");
        assert_eq!(err.downcast_ref::<ExternalToolError>().unwrap().code, 1);
    }

    #[test]
    fn test_missing_program() {
        let err = Cmd::new("nonexistent_program_12345").run().unwrap_err();
        assert!(err.downcast_ref::<ExternalToolError>().is_none());
        assert!(err.to_string().contains("Is it installed?"));
    }

    #[test]
    fn test_template_substitution() {
        let t = CommandTemplate::parse("xdvdfs build-image {options} {input} {output}").unwrap();
        let args = t.render(
            Path::new("/src"),
            Path::new("/out.iso"),
            &["-m".into(), "**/*.{ext1,ext2}:/{3}/{2}".into()],
        );
        assert_eq!(t.program(), "xdvdfs");
        assert_eq!(
            args,
            vec!["build-image", "-m", "**/*.{ext1,ext2}:/{3}/{2}", "/src", "/out.iso"]
        );
    }

    #[test]
    fn test_template_embedded_placeholders() {
        let t = CommandTemplate::from_argv(vec!["tool".into(), "--in={input}".into()]).unwrap();
        assert_eq!(t.render(Path::new("a b"), Path::new("o"), &[]), vec!["--in=a b"]);
    }

    #[test]
    fn test_template_rejects_bad_forms() {
        assert!(CommandTemplate::parse("   ").is_err());
        assert!(CommandTemplate::parse("tool -x{options}").is_err());
    }

    #[test]
    fn test_template_run() {
        let t = CommandTemplate::from_argv(vec![
            "sh".into(),
            "-c".into(),
            "printf %s \"$1\"".into(),
            "sh".into(),
            "{output}".into(),
        ])
        .unwrap();
        let result = t.run(Path::new("in"), Path::new("out"), &[]).unwrap();
        assert_eq!(result.stdout, "out");
    }
}
