// File: sleeve-forms/src/config.rs
// Purpose: Form configuration (discovery attribute, rules, extra presets), optionally from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::FormResult;
use crate::rules::{Rule, RuleRegistry};

/// Key under which the general (fallback) rule is stored
pub const GENERAL_RULE_KEY: &str = "general";

/// A rule given either as a raw pattern or by preset name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Pattern(String),
    Preset { preset: String },
}

impl RuleSpec {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        RuleSpec::Pattern(pattern.into())
    }

    pub fn preset(name: impl Into<String>) -> Self {
        RuleSpec::Preset {
            preset: name.into(),
        }
    }

    /// Compile the rule, looking presets up in `registry`
    pub fn resolve(&self, registry: &RuleRegistry) -> FormResult<Rule> {
        match self {
            RuleSpec::Pattern(pattern) => Rule::new(pattern),
            RuleSpec::Preset { preset } => registry.rule(preset),
        }
    }
}

/// Form configuration
///
/// ```toml
/// field_attribute = "name"
/// general = { preset = "not-empty" }
///
/// [rules]
/// email = { preset = "email-address" }
/// qty = "^[0-9]+$"
///
/// [presets]
/// zip-code = '^\d{5}$'
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Attribute that marks a descendant as a field and carries its name
    #[serde(default = "default_field_attribute", alias = "fieldAttribute")]
    pub field_attribute: String,

    /// Rule for fields without a rule of their own
    #[serde(default)]
    pub general: Option<RuleSpec>,

    /// Per-field rules
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSpec>,

    /// Extra named rules, added to the built-in presets
    #[serde(default)]
    pub presets: BTreeMap<String, String>,
}

fn default_field_attribute() -> String {
    "name".to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            field_attribute: default_field_attribute(),
            general: None,
            rules: BTreeMap::new(),
            presets: BTreeMap::new(),
        }
    }
}

impl FormConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(content).context("Failed to parse form configuration")
    }

    /// Load configuration from a TOML file. A missing file yields the default.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load form config file: {:?}", path))
    }

    /// Built-in presets extended with this config's presets
    pub fn registry(&self) -> FormResult<RuleRegistry> {
        self.presets
            .iter()
            .try_fold(RuleRegistry::builtin(), |registry, (name, pattern)| {
                registry.with_preset(name.as_str(), pattern.as_str())
            })
    }

    /// Compile every configured rule, keyed the way the form stores them
    /// (the general rule under [`GENERAL_RULE_KEY`])
    pub fn compile_rules(&self, registry: &RuleRegistry) -> FormResult<BTreeMap<String, Rule>> {
        let mut rules = BTreeMap::new();

        if let Some(general) = &self.general {
            rules.insert(GENERAL_RULE_KEY.to_string(), general.resolve(registry)?);
        }

        for (field, spec) in &self.rules {
            rules.insert(field.clone(), spec.resolve(registry)?);
        }

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use crate::rules::{EMAIL_ADDRESS, NOT_EMPTY};

    #[test]
    fn test_default_config() {
        let config = FormConfig::default();
        assert_eq!(config.field_attribute, "name");
        assert!(config.general.is_none());
        assert!(config.rules.is_empty());
        assert!(config.presets.is_empty());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(FormConfig::from_toml_str("  \n").unwrap(), FormConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = FormConfig::from_toml_str(
            r#"
            field_attribute = "data-field"
            general = { preset = "not-empty" }

            [rules]
            email = { preset = "email-address" }
            qty = "^[0-9]+$"

            [presets]
            zip-code = '^\d{5}$'
            "#,
        )
        .unwrap();

        assert_eq!(config.field_attribute, "data-field");
        assert_eq!(config.general, Some(RuleSpec::preset("not-empty")));
        assert_eq!(config.rules["qty"], RuleSpec::pattern("^[0-9]+$"));
        assert_eq!(config.presets["zip-code"], r"^\d{5}$");

        let registry = config.registry().unwrap();
        assert!(registry.contains("zip-code"));

        let rules = config.compile_rules(&registry).unwrap();
        assert_eq!(rules[GENERAL_RULE_KEY].pattern(), NOT_EMPTY);
        assert_eq!(rules["email"].pattern(), EMAIL_ADDRESS);
        assert_eq!(rules["qty"].pattern(), "^[0-9]+$");
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        let mut config = FormConfig::default();
        config.rules.insert("qty".to_string(), RuleSpec::preset("nope"));

        let registry = config.registry().unwrap();
        let err = config.compile_rules(&registry).unwrap_err();
        assert!(matches!(err, FormError::UnknownPreset(ref name) if name == "nope"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_broken_preset_pattern_is_rejected() {
        let mut config = FormConfig::default();
        config.presets.insert("broken".to_string(), "(".to_string());
        assert!(matches!(
            config.registry(),
            Err(FormError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = FormConfig::load("definitely/not/here/sleeve.toml").unwrap();
        assert_eq!(config, FormConfig::default());
    }

    #[test]
    fn test_malformed_toml_fails() {
        assert!(FormConfig::from_toml_str("rules = 3").is_err());
    }
}
