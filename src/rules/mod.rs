//! Map rules: which source files go into an image, and where.
//!
//! A rule is written `[!]source-pattern[:destination-template]`:
//!
//! ```text
//! bin:/                       # everything under bin/ goes to the image root
//! **/*.{ext1,ext2}:/{3}/{2}   # a/file1.ext1 -> ext1/file1
//! !**/excluded                # drop every file named "excluded"
//! assets/excluded:assets/excluded
//! ```
//!
//! Each file is first given a match prefix: the deepest of its
//! ancestor-or-self paths that any rule matches. Every rule is then tested
//! against that prefix only, and the part of the path below it is appended
//! to the rendered destination. `bin:/` therefore maps `bin/default.xbe` to
//! `default.xbe`, while a rule naming the file itself takes precedence over
//! rules naming its directories.
//!
//! Rules are evaluated in declaration order. A matching exclusion clears
//! whatever an earlier rule decided, so a later inclusion can bring the file
//! back. Among inclusions, the first one standing after the last matching
//! exclusion decides the destination.

mod error;
mod pattern;
mod resolve;
mod template;

pub use error::{PatternError, ResolveError, RuleError, TemplateError};
pub use pattern::{Captures, Pattern, Segment, Token};
pub use resolve::list_source_files;
pub use template::DestinationTemplate;

use std::fmt;

/// What a rule does with the files it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Include(DestinationTemplate),
    Exclude,
}

/// A single compiled map rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    text: String,
    pattern: Pattern,
    action: Action,
}

/// A rule's match against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub captures: Captures,
    /// Path below the match prefix; empty when the file itself matched.
    pub suffix: String,
}

impl Rule {
    /// Parse `[!]pattern[:template]`.
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RuleError::Empty);
        }

        let mut fields = text.split(':');
        let host = fields.next().unwrap_or_default();
        let image = fields.next();
        if fields.next().is_some() {
            return Err(RuleError::ExtraSeparator {
                rule: text.to_owned(),
            });
        }

        if let Some(host) = host.strip_prefix('!') {
            return Self::build(text, host, None);
        }

        let Some(image) = image else {
            return Err(RuleError::MissingDestination {
                rule: text.to_owned(),
            });
        };
        Self::build(text, host, Some(image))
    }

    /// Build from the `(host, image)` pair used in image spec files.
    ///
    /// A host starting with `!` is an exclusion and its image path is ignored.
    pub fn from_pair(host: &str, image: &str) -> Result<Self, RuleError> {
        match host.strip_prefix('!') {
            Some(pattern) => Self::build(host, pattern, None),
            None => Self::build(&format!("{host}:{image}"), host, Some(image)),
        }
    }

    pub fn include(pattern: &str, template: &str) -> Result<Self, RuleError> {
        Self::build(&format!("{pattern}:{template}"), pattern, Some(template))
    }

    pub fn exclude(pattern: &str) -> Result<Self, RuleError> {
        Self::build(&format!("!{pattern}"), pattern, None)
    }

    /// Exact mapping of one source file to one destination, with no glob
    /// or placeholder interpretation on either side.
    pub fn literal(source: &str, dest: &str) -> Self {
        Self {
            text: format!("{source}:{dest}"),
            pattern: Pattern::literal(source),
            action: Action::Include(DestinationTemplate::literal(dest)),
        }
    }

    fn build(text: &str, pattern: &str, template: Option<&str>) -> Result<Self, RuleError> {
        let pattern = Pattern::compile(pattern).map_err(|source| RuleError::Pattern {
            rule: text.to_owned(),
            source,
        })?;

        let action = match template {
            None => Action::Exclude,
            Some(template) => {
                let template = DestinationTemplate::parse(template)
                    .and_then(|t| t.check_captures(pattern.capture_count()).map(|_| t))
                    .map_err(|source| RuleError::Template {
                        rule: text.to_owned(),
                        source,
                    })?;
                Action::Include(template)
            }
        };

        Ok(Self {
            text: text.to_owned(),
            pattern,
            action,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn is_negation(&self) -> bool {
        self.action == Action::Exclude
    }

    pub fn destination(&self) -> Option<&DestinationTemplate> {
        match &self.action {
            Action::Include(t) => Some(t),
            Action::Exclude => None,
        }
    }

    /// Spec file form: `(host, image)`, with an empty image for exclusions.
    pub fn to_pair(&self) -> (String, String) {
        match &self.action {
            Action::Include(t) => (self.pattern.as_str().to_owned(), t.as_str().to_owned()),
            Action::Exclude => (format!("!{}", self.pattern.as_str()), String::new()),
        }
    }

    /// Match the first `depth` components of `parts`; the rest become the suffix.
    pub fn match_prefix(&self, parts: &[&str], depth: usize) -> Option<RuleMatch> {
        let depth = depth.min(parts.len());
        self.pattern
            .matches_parts(&parts[..depth])
            .map(|captures| RuleMatch {
                captures,
                suffix: parts[depth..].join("/"),
            })
    }

    /// Rendered, normalised image path for a match. `None` for exclusions.
    pub fn render(&self, m: &RuleMatch) -> Option<String> {
        let template = self.destination()?;
        let rendered = template.render(&m.captures);
        let joined = if m.suffix.is_empty() {
            rendered
        } else {
            format!("{}/{}", rendered.trim_end_matches('/'), m.suffix)
        };
        Some(normalize_image_path(&joined))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Strip empty and `.` components; image paths are relative to the image root.
pub fn normalize_image_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// The outcome of evaluating a rule set against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition<'r> {
    Included { dest: String, rule: &'r Rule },
    /// `rule` is the last exclusion that matched, or `None` if nothing matched.
    Excluded { rule: Option<&'r Rule> },
}

/// An ordered, immutable list of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse rule strings of the form accepted by `-m`.
    pub fn parse<I, S>(rules: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|r| Rule::parse(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn from_pairs<I, H, D>(pairs: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (H, D)>,
        H: AsRef<str>,
        D: AsRef<str>,
    {
        let rules = pairs
            .into_iter()
            .map(|(h, d)| Rule::from_pair(h.as_ref(), d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of leading components of `parts` forming the match prefix.
    ///
    /// This is the deepest ancestor-or-self that any rule, exclusions
    /// included, matches. `None` when no rule matches any of them.
    pub fn prefix_depth(&self, parts: &[&str]) -> Option<usize> {
        (1..=parts.len()).rev().find(|&depth| {
            self.rules
                .iter()
                .any(|rule| rule.pattern.matches_parts(&parts[..depth]).is_some())
        })
    }

    /// Decide what happens to one file, by a single scan over the rules.
    pub fn disposition(&self, path: &str) -> Disposition<'_> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some(depth) = self.prefix_depth(&parts) else {
            return Disposition::Excluded { rule: None };
        };

        let mut standing: Option<(&Rule, RuleMatch)> = None;
        let mut last_exclusion: Option<&Rule> = None;

        for rule in &self.rules {
            let Some(m) = rule.match_prefix(&parts, depth) else {
                continue;
            };
            match rule.action {
                Action::Exclude => {
                    standing = None;
                    last_exclusion = Some(rule);
                }
                Action::Include(_) => {
                    if standing.is_none() {
                        standing = Some((rule, m));
                    }
                }
            }
        }

        match standing {
            Some((rule, m)) => Disposition::Included {
                // Include rules always render.
                dest: rule.render(&m).unwrap_or_default(),
                rule,
            },
            None => Disposition::Excluded {
                rule: last_exclusion,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(rules: &RuleSet, path: &str) -> Option<String> {
        match rules.disposition(path) {
            Disposition::Included { dest, .. } => Some(dest),
            Disposition::Excluded { .. } => None,
        }
    }

    #[test]
    fn parses_inclusion_and_negation() {
        let r = Rule::parse("assets/**:/{0}").unwrap();
        assert!(!r.is_negation());
        assert_eq!(r.pattern().as_str(), "assets/**");
        assert_eq!(r.destination().unwrap().as_str(), "/{0}");

        let r = Rule::parse("!**/excluded").unwrap();
        assert!(r.is_negation());
        assert!(r.destination().is_none());
        assert_eq!(r.to_pair(), ("!**/excluded".to_owned(), String::new()));
    }

    #[test]
    fn negation_ignores_destination() {
        let r = Rule::parse("!a/*:{9}").unwrap();
        assert!(r.is_negation());
    }

    #[test]
    fn extra_separator_is_rejected() {
        assert_eq!(
            Rule::parse("a:b:c"),
            Err(RuleError::ExtraSeparator { rule: "a:b:c".into() })
        );
        assert!(Rule::parse("!a:b:c").is_err());
    }

    #[test]
    fn inclusion_needs_destination() {
        assert_eq!(
            Rule::parse("bin"),
            Err(RuleError::MissingDestination { rule: "bin".into() })
        );
        assert_eq!(Rule::parse("  "), Err(RuleError::Empty));
    }

    #[test]
    fn template_range_checked_at_construction() {
        let err = Rule::parse("**/*.{a,b}:/{4}").unwrap_err();
        assert!(matches!(
            err,
            RuleError::Template {
                source: TemplateError::CaptureOutOfRange { index: 4, available: 3, .. },
                ..
            }
        ));
        assert!(matches!(
            Rule::parse("a/{b:c"),
            Err(RuleError::Pattern { .. })
        ));
    }

    #[test]
    fn directory_rule_carries_suffix() {
        let rules = RuleSet::parse(["bin:/"]).unwrap();
        assert_eq!(dest(&rules, "bin/default.xbe").as_deref(), Some("default.xbe"));
        assert_eq!(dest(&rules, "bin/sub/x").as_deref(), Some("sub/x"));
        assert_eq!(dest(&rules, "binary"), None);
    }

    #[test]
    fn deepest_matching_ancestor_is_the_prefix() {
        let rules = RuleSet::parse(["bin:/", "assets/**:/{0}"]).unwrap();
        assert_eq!(rules.prefix_depth(&["bin", "sub", "x"]), Some(1));
        assert_eq!(rules.prefix_depth(&["assets", "asset1"]), Some(2));
        assert_eq!(rules.prefix_depth(&["src", "main.c"]), None);

        let r = &rules.rules()[1];
        let m = r.match_prefix(&["assets", "asset1"], 2).unwrap();
        assert_eq!(m.captures.get(0), Some("assets/asset1"));
        assert_eq!(m.suffix, "");
        assert_eq!(r.render(&m).as_deref(), Some("assets/asset1"));
    }

    #[test]
    fn file_rule_overrides_directory_rule() {
        let rules = RuleSet::parse(["assets:/data", "assets/*.png:/img/{1}.png"]).unwrap();
        assert_eq!(dest(&rules, "assets/a.png").as_deref(), Some("img/a.png"));
        assert_eq!(dest(&rules, "assets/b.txt").as_deref(), Some("data/b.txt"));
    }

    #[test]
    fn directory_negation_does_not_clear_file_match() {
        let rules = RuleSet::parse(["**/*.txt:/txt/{2}", "!docs"]).unwrap();
        assert_eq!(dest(&rules, "docs/a.txt").as_deref(), Some("txt/a"));
        assert!(matches!(
            rules.disposition("docs/a.md"),
            Disposition::Excluded { rule: Some(r) } if r.text() == "!docs"
        ));
    }

    #[test]
    fn later_inclusion_overrides_broad_negation() {
        let rules = RuleSet::parse(["!**/excluded", "assets/excluded:assets/excluded"]).unwrap();
        assert_eq!(
            dest(&rules, "assets/excluded").as_deref(),
            Some("assets/excluded")
        );
        match rules.disposition("a/excluded") {
            Disposition::Excluded { rule: Some(r) } => assert_eq!(r.text(), "!**/excluded"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn earlier_inclusion_stands_against_later_inclusion() {
        let rules = RuleSet::parse([
            "a/specific.ext1:/specific.ext1",
            "**/*.{ext1,ext2}:/{3}/{2}",
        ])
        .unwrap();
        assert_eq!(
            dest(&rules, "a/specific.ext1").as_deref(),
            Some("specific.ext1")
        );
        assert_eq!(dest(&rules, "a/file1.ext1").as_deref(), Some("ext1/file1"));
    }

    #[test]
    fn unmatched_files_are_excluded_by_default() {
        let rules = RuleSet::parse(["bin:/"]).unwrap();
        assert_eq!(
            rules.disposition("src/main.c"),
            Disposition::Excluded { rule: None }
        );
    }

    #[test]
    fn normalizes_destination() {
        assert_eq!(normalize_image_path("/./a//b/"), "a/b");
        assert_eq!(normalize_image_path("/"), "");
    }

    #[test]
    fn pairs_round_trip() {
        let rules = RuleSet::parse(["bin:/", "!**/excluded"]).unwrap();
        let pairs: Vec<_> = rules.rules().iter().map(Rule::to_pair).collect();
        assert_eq!(RuleSet::from_pairs(pairs).unwrap(), rules);
    }
}
