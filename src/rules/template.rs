//! Destination templates: image paths with `{n}` capture references.

use std::fmt;

use super::error::TemplateError;
use super::pattern::Captures;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Capture(usize),
}

/// A compiled destination template, e.g. `/{3}/{2}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTemplate {
    source: String,
    parts: Vec<Part>,
}

impl DestinationTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut open: Option<usize> = None;
        let mut index: usize = 0;
        let mut digits = 0;

        for (offset, c) in template.char_indices() {
            if open.is_none() {
                if c == '{' {
                    open = Some(offset);
                    index = 0;
                    digits = 0;
                } else {
                    literal.push(c);
                }
                continue;
            }

            if c == '}' {
                if digits == 0 {
                    return Err(TemplateError::NonDigit {
                        template: template.to_owned(),
                        offset,
                    });
                }
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                parts.push(Part::Capture(index));
                open = None;
                continue;
            }

            let Some(digit) = c.to_digit(10) else {
                return Err(TemplateError::NonDigit {
                    template: template.to_owned(),
                    offset,
                });
            };
            index = index.saturating_mul(10).saturating_add(digit as usize);
            digits += 1;
        }

        if let Some(offset) = open {
            return Err(TemplateError::UnclosedBrace {
                template: template.to_owned(),
                offset,
            });
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: template.to_owned(),
            parts,
        })
    }

    /// A template that renders to `path` verbatim, braces included.
    pub fn literal(path: &str) -> Self {
        Self {
            source: path.to_owned(),
            parts: vec![Part::Literal(path.to_owned())],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Capture indices referenced by this template, in order of appearance.
    pub fn references(&self) -> impl Iterator<Item = usize> + '_ {
        self.parts.iter().filter_map(|p| match p {
            Part::Capture(i) => Some(*i),
            Part::Literal(_) => None,
        })
    }

    /// Ensure every reference fits a pattern with `capture_count` constructs.
    pub fn check_captures(&self, capture_count: usize) -> Result<(), TemplateError> {
        match self.references().find(|i| *i > capture_count) {
            Some(index) => Err(TemplateError::CaptureOutOfRange {
                template: self.source.clone(),
                index,
                available: capture_count,
            }),
            None => Ok(()),
        }
    }

    /// Substitute captures. Indices were validated at rule construction.
    pub fn render(&self, captures: &Captures) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Capture(i) => out.push_str(captures.get(*i).unwrap_or("")),
            }
        }
        out
    }
}

impl fmt::Display for DestinationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
