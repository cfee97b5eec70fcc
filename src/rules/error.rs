//! Errors raised while building and resolving map rules.
//!
//! Pattern and template errors are construction-time failures: they surface
//! once, before any file is resolved. Resolve errors come from walking the
//! source tree or from a mapping that cannot be turned into an image layout.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// A malformed source pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern has no path components.
    Empty,
    /// `{` without a matching `}`.
    UnterminatedAlternation { pattern: String, offset: usize },
    /// `}` without a preceding `{`.
    UnopenedAlternation { pattern: String, offset: usize },
    /// `{` inside an alternation group.
    NestedAlternation { pattern: String, offset: usize },
    /// `{}` or a group with an empty option, e.g. `{a,}`.
    EmptyAlternative { pattern: String, offset: usize },
    /// Alternation options are literal and may not contain these characters.
    InvalidAlternative { pattern: String, offset: usize, ch: char },
    /// `**` mixed with other characters inside one segment.
    MisplacedTreeWildcard { pattern: String, segment: String },
    /// `a//b`
    EmptySegment { pattern: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Empty => f.write_str("pattern must not be empty"),
            PatternError::UnterminatedAlternation { pattern, offset } => {
                write!(f, "unterminated '{{' at {offset} in pattern \"{pattern}\"")
            }
            PatternError::UnopenedAlternation { pattern, offset } => {
                write!(f, "unexpected '}}' at {offset} in pattern \"{pattern}\"")
            }
            PatternError::NestedAlternation { pattern, offset } => {
                write!(f, "nested '{{' at {offset} in pattern \"{pattern}\"")
            }
            PatternError::EmptyAlternative { pattern, offset } => {
                write!(f, "empty alternative at {offset} in pattern \"{pattern}\"")
            }
            PatternError::InvalidAlternative {
                pattern,
                offset,
                ch,
            } => write!(
                f,
                "character '{ch}' not allowed inside alternation (at {offset}) in pattern \"{pattern}\""
            ),
            PatternError::MisplacedTreeWildcard { pattern, segment } => write!(
                f,
                "'**' must be a whole path segment, found \"{segment}\" in pattern \"{pattern}\""
            ),
            PatternError::EmptySegment { pattern } => {
                write!(f, "empty path segment (// not allowed) in pattern \"{pattern}\"")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// A destination template that cannot be rendered against its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `{` without a closing `}`.
    UnclosedBrace { template: String, offset: usize },
    /// Something other than a digit between braces.
    NonDigit { template: String, offset: usize },
    /// `{n}` where the pattern only has slots `0..=available`.
    CaptureOutOfRange {
        template: String,
        index: usize,
        available: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnclosedBrace { template, offset } => {
                write!(f, "invalid rewrite substitution \"{template}\" (at {offset}): unclosed brace")
            }
            TemplateError::NonDigit { template, offset } => write!(
                f,
                "invalid rewrite substitution \"{template}\" (at {offset}): expected digit character"
            ),
            TemplateError::CaptureOutOfRange {
                template,
                index,
                available,
            } => write!(
                f,
                "rewrite \"{template}\" references capture {{{index}}}, but the pattern only has captures {{0}}..{{{available}}}"
            ),
        }
    }
}

impl std::error::Error for TemplateError {}

/// A map rule that failed to parse or compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Rule text was empty.
    Empty,
    /// Inclusion rule without a `:destination` part.
    MissingDestination { rule: String },
    /// More than one `:` in a rule.
    ExtraSeparator { rule: String },
    Pattern { rule: String, source: PatternError },
    Template { rule: String, source: TemplateError },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::Empty => f.write_str("map rule cannot be empty"),
            RuleError::MissingDestination { rule } => write!(
                f,
                "map rule \"{rule}\" must have an image path unless it is an exclusion rule (starting with '!')"
            ),
            RuleError::ExtraSeparator { rule } => write!(
                f,
                "map rule \"{rule}\" has more than one ':' separator"
            ),
            RuleError::Pattern { rule, source } => write!(f, "map rule \"{rule}\": {source}"),
            RuleError::Template { rule, source } => write!(f, "map rule \"{rule}\": {source}"),
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuleError::Pattern { source, .. } => Some(source),
            RuleError::Template { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure while resolving a rule set against a source tree.
#[derive(Debug)]
pub enum ResolveError {
    Io { path: PathBuf, source: io::Error },
    NonUtf8Path(PathBuf),
    EmptyDestination { source_path: String, rule: String },
    DuplicateDestination {
        dest: String,
        first: String,
        second: String,
    },
    /// `dest` is mapped as a file but is also a parent directory of `child`.
    FileDirectoryClash { dest: String, child: String },
    /// `dest` has a `..` component and would land outside the image root.
    EscapesImageRoot { source_path: String, dest: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ResolveError::NonUtf8Path(path) => {
                write!(f, "source path is not valid UTF-8: {}", path.display())
            }
            ResolveError::EmptyDestination { source_path, rule } => write!(
                f,
                "rule \"{rule}\" maps \"{source_path}\" onto the image root"
            ),
            ResolveError::DuplicateDestination { dest, first, second } => write!(
                f,
                "\"{first}\" and \"{second}\" both map to image path \"{dest}\""
            ),
            ResolveError::FileDirectoryClash { dest, child } => write!(
                f,
                "image path \"{dest}\" is mapped as a file but \"{child}\" needs it as a directory"
            ),
            ResolveError::EscapesImageRoot { source_path, dest } => write!(
                f,
                "\"{source_path}\" maps to \"{dest}\", which is outside the image root"
            ),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
