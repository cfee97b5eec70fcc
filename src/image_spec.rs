//! Image spec files (`xdvdfs.toml`): map rules in persisted form.
//!
//! ```toml
//! [metadata]
//! output = "dist/game.iso"
//!
//! [map_rules]
//! bin = "/"
//! "**/*.{ext1,ext2}" = "/{3}/{2}"
//! "!**/excluded" = ""
//! ```
//!
//! Rule order is significant, so the table keeps declaration order.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::rules::{Rule, RuleSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub metadata: Option<ImageInfo>,
    pub map_rules: Option<toml::Table>,
}

impl ImageSpec {
    /// Build a spec from `-m` style rule strings.
    ///
    /// Every rule is compiled first so a bad rule never reaches disk.
    pub fn from_rules<S: AsRef<str>>(rules: &[S], output: Option<String>) -> Result<Self> {
        let mut table = toml::Table::new();
        for text in rules {
            let rule = Rule::parse(text.as_ref())?;
            let (host, image) = rule.to_pair();
            if table.contains_key(&host) {
                bail!("Map rule for \"{host}\" is given more than once");
            }
            table.insert(host, toml::Value::String(image));
        }

        Ok(Self {
            metadata: output.map(|output| ImageInfo {
                output: Some(output),
            }),
            map_rules: (!table.is_empty()).then_some(table),
        })
    }

    /// `(host, image)` pairs in declaration order.
    pub fn rule_pairs(&self) -> Result<Vec<(String, String)>> {
        let Some(table) = &self.map_rules else {
            return Ok(Vec::new());
        };
        table
            .iter()
            .map(|(key, value)| {
                let image = value
                    .as_str()
                    .ok_or_else(|| anyhow!("Invalid value type for key {key}, expected String"))?;
                Ok::<_, anyhow::Error>((key.clone(), image.to_owned()))
            })
            .collect()
    }

    pub fn rule_set(&self) -> Result<RuleSet> {
        Ok(RuleSet::from_pairs(self.rule_pairs()?)?)
    }

    pub fn output(&self) -> Option<&str> {
        self.metadata.as_ref()?.output.as_deref()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize image spec")
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse image spec")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::common::write_file_with_dirs(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid image spec {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleError;

    const RULES: &[&str] = &[
        "bin:/",
        "assets/**:/{0}",
        "**/*.{ext1,ext2}:/{3}/{2}",
        "!**/excluded",
        "assets/excluded:assets/excluded",
    ];

    #[test]
    fn emits_rules_table_in_order() {
        let spec = ImageSpec::from_rules(RULES, Some("out.iso".into())).unwrap();
        let text = spec.to_toml().unwrap();
        assert!(text.contains("[map_rules]"));
        assert!(text.contains("output = \"out.iso\""));

        let bin = text.find("bin").unwrap();
        let negation = text.find("!**/excluded").unwrap();
        assert!(bin < negation);
    }

    #[test]
    fn reloaded_spec_gives_same_rules() {
        let spec = ImageSpec::from_rules(RULES, None).unwrap();
        let reloaded = ImageSpec::from_toml(&spec.to_toml().unwrap()).unwrap();
        assert_eq!(reloaded.rule_set().unwrap(), RuleSet::parse(RULES).unwrap());
        assert_eq!(reloaded.output(), None);
    }

    #[test]
    fn rejects_invalid_rules() {
        let err = ImageSpec::from_rules(&["bin"], None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RuleError>(),
            Some(RuleError::MissingDestination { .. })
        ));
    }

    #[test]
    fn duplicate_host_is_rejected() {
        let err = ImageSpec::from_rules(&["a:/x", "a:/y"], None).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_non_string_values() {
        let spec = ImageSpec::from_toml("[map_rules]\nbin = 3\n").unwrap();
        assert!(spec.rule_pairs().is_err());
    }

    #[test]
    fn reads_hand_written_spec() {
        let text = r#"
            [map_rules]
            "host/**/path" = "/image/path/{1}"
            "!negated/match" = ""
        "#;
        let rules = ImageSpec::from_toml(text).unwrap().rule_set().unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.rules()[1].is_negation());
    }
}
