//! Source-side glob patterns with positional captures.
//!
//! Supported syntax:
//! - `**` - a whole segment matching zero or more path segments
//! - `*` - one or more characters within a single segment
//! - `?` - exactly one character within a single segment
//! - `{a,b,c}` - one of the listed literal options
//!
//! Every construct produces one capture slot, numbered left to right from 1.
//! Slot 0 always holds the whole matched path, so `**/*.{ext1,ext2}` against
//! `a/file1.ext1` captures `["a/file1.ext1", "a", "file1", "ext1"]`.
//!
//! Matching is anchored and backtracking: `**` and `*` try their longest
//! candidate first, alternation options are tried in listed order, and the
//! first combination that consumes the whole path wins.

use std::fmt;

use super::error::PatternError;

/// One matcher within a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    /// `*`
    Star,
    /// `?`
    Question,
    /// `{a,b}`
    Alternation(Vec<String>),
}

impl Token {
    fn is_capture(&self) -> bool {
        !matches!(self, Token::Literal(_))
    }
}

/// A pattern component between `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `**`: zero or more whole path segments.
    Tree,
    /// A single path segment built from tokens.
    Name(Vec<Token>),
}

/// Captured text from a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    slots: Vec<String>,
}

impl Captures {
    /// Capture `index`, where 0 is the whole match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(String::as_str)
    }
}

/// A compiled source pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
    capture_count: usize,
}

impl Pattern {
    /// Compile a glob pattern.
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        let mut body = raw;
        loop {
            if let Some(rest) = body.strip_prefix("./") {
                body = rest;
            } else if let Some(rest) = body.strip_prefix('/') {
                body = rest;
            } else {
                break;
            }
        }
        let base = raw.len() - body.len();
        let body = body.trim_end_matches('/');

        if body.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut parser = Parser {
            raw,
            base,
            segments: Vec::new(),
            tokens: Vec::new(),
            literal: String::new(),
            text: String::new(),
        };

        let mut chars = body.char_indices();
        while let Some((offset, ch)) = chars.next() {
            match ch {
                '/' => parser.finish_segment()?,
                '*' => parser.push_token(Token::Star, ch),
                '?' => parser.push_token(Token::Question, ch),
                '}' => {
                    return Err(PatternError::UnopenedAlternation {
                        pattern: raw.to_owned(),
                        offset: base + offset,
                    })
                }
                '{' => {
                    let options = parser.alternation(offset, &mut chars)?;
                    parser.push_token(Token::Alternation(options), '{');
                }
                c => {
                    parser.literal.push(c);
                    parser.text.push(c);
                }
            }
        }
        parser.finish_segment()?;

        let capture_count = parser
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Tree => 1,
                Segment::Name(tokens) => tokens.iter().filter(|t| t.is_capture()).count(),
            })
            .sum();

        Ok(Self {
            source: raw.to_owned(),
            segments: parser.segments,
            capture_count,
        })
    }

    /// A pattern matching exactly `path`, with no wildcard interpretation.
    pub fn literal(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| Segment::Name(vec![Token::Literal(s.to_owned())]))
            .collect();
        Self {
            source: path.to_owned(),
            segments,
            capture_count: 0,
        }
    }

    /// The text this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of capture constructs. Valid template indices are `0..=capture_count`.
    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    /// Match a `/`-separated relative path, returning its captures.
    pub fn matches(&self, path: &str) -> Option<Captures> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.matches_parts(&parts)
    }

    pub(crate) fn matches_parts(&self, parts: &[&str]) -> Option<Captures> {
        if parts.is_empty() || self.segments.is_empty() {
            return None;
        }

        let mut slots = vec![String::new(); self.capture_count + 1];
        if !self.match_segments(0, 0, 1, parts, &mut slots) {
            return None;
        }
        slots[0] = parts.join("/");
        Some(Captures { slots })
    }

    fn match_segments(
        &self,
        seg: usize,
        part: usize,
        slot: usize,
        parts: &[&str],
        slots: &mut [String],
    ) -> bool {
        let Some(segment) = self.segments.get(seg) else {
            return part == parts.len();
        };

        match segment {
            Segment::Tree => {
                let remaining = parts.len() - part;
                for take in (0..=remaining).rev() {
                    slots[slot] = parts[part..part + take].join("/");
                    if self.match_segments(seg + 1, part + take, slot + 1, parts, slots) {
                        return true;
                    }
                }
                false
            }
            Segment::Name(tokens) => {
                if part >= parts.len() {
                    return false;
                }
                self.match_tokens(tokens, 0, seg, part, 0, slot, parts, slots)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn match_tokens(
        &self,
        tokens: &[Token],
        tok: usize,
        seg: usize,
        part: usize,
        pos: usize,
        slot: usize,
        parts: &[&str],
        slots: &mut [String],
    ) -> bool {
        let name = parts[part];
        let Some(token) = tokens.get(tok) else {
            return pos == name.len() && self.match_segments(seg + 1, part + 1, slot, parts, slots);
        };
        let rest = &name[pos..];

        match token {
            Token::Literal(lit) => {
                rest.starts_with(lit.as_str())
                    && self.match_tokens(tokens, tok + 1, seg, part, pos + lit.len(), slot, parts, slots)
            }
            Token::Question => {
                let Some(ch) = rest.chars().next() else {
                    return false;
                };
                slots[slot] = ch.to_string();
                self.match_tokens(tokens, tok + 1, seg, part, pos + ch.len_utf8(), slot + 1, parts, slots)
            }
            Token::Star => {
                let ends: Vec<usize> = rest.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
                for end in ends.into_iter().rev() {
                    slots[slot] = rest[..end].to_owned();
                    if self.match_tokens(tokens, tok + 1, seg, part, pos + end, slot + 1, parts, slots) {
                        return true;
                    }
                }
                false
            }
            Token::Alternation(options) => {
                for option in options {
                    if !rest.starts_with(option.as_str()) {
                        continue;
                    }
                    slots[slot] = option.clone();
                    if self.match_tokens(tokens, tok + 1, seg, part, pos + option.len(), slot + 1, parts, slots) {
                        return true;
                    }
                }
                false
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    raw: &'a str,
    base: usize,
    segments: Vec<Segment>,
    tokens: Vec<Token>,
    literal: String,
    /// Raw text of the current segment, used to spot `**`.
    text: String,
}

impl Parser<'_> {
    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.tokens.push(Token::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn push_token(&mut self, token: Token, ch: char) {
        self.flush_literal();
        self.tokens.push(token);
        self.text.push(ch);
    }

    fn finish_segment(&mut self) -> Result<(), PatternError> {
        self.flush_literal();
        let tokens = std::mem::take(&mut self.tokens);
        let text = std::mem::take(&mut self.text);

        if tokens.is_empty() {
            return Err(PatternError::EmptySegment {
                pattern: self.raw.to_owned(),
            });
        }

        if text == "**" {
            self.segments.push(Segment::Tree);
            return Ok(());
        }

        let adjacent_stars = tokens
            .windows(2)
            .any(|w| w[0] == Token::Star && w[1] == Token::Star);
        if adjacent_stars {
            return Err(PatternError::MisplacedTreeWildcard {
                pattern: self.raw.to_owned(),
                segment: text,
            });
        }

        self.segments.push(Segment::Name(tokens));
        Ok(())
    }

    /// Parse the options of a `{...}` group; `open` is the offset of `{`.
    fn alternation(
        &mut self,
        open: usize,
        chars: &mut std::str::CharIndices<'_>,
    ) -> Result<Vec<String>, PatternError> {
        let mut options = Vec::new();
        let mut current = String::new();

        for (offset, ch) in chars.by_ref() {
            let at = self.base + offset;
            match ch {
                '}' => {
                    if current.is_empty() {
                        return Err(PatternError::EmptyAlternative {
                            pattern: self.raw.to_owned(),
                            offset: at,
                        });
                    }
                    options.push(current);
                    return Ok(options);
                }
                ',' => {
                    if current.is_empty() {
                        return Err(PatternError::EmptyAlternative {
                            pattern: self.raw.to_owned(),
                            offset: at,
                        });
                    }
                    options.push(std::mem::take(&mut current));
                }
                '{' => {
                    return Err(PatternError::NestedAlternation {
                        pattern: self.raw.to_owned(),
                        offset: at,
                    })
                }
                '/' | '*' | '?' => {
                    return Err(PatternError::InvalidAlternative {
                        pattern: self.raw.to_owned(),
                        offset: at,
                        ch,
                    })
                }
                c => current.push(c),
            }
        }

        Err(PatternError::UnterminatedAlternation {
            pattern: self.raw.to_owned(),
            offset: self.base + open,
        })
    }
}
