//! Rule registry
//!
//! A rule is a regular expression a field value is tested against. The
//! registry maps rule names (`"email-address"`, `"positive-integer"`, ...)
//! to their patterns. It is a plain value handed to the form through
//! [`FormConfig`](crate::FormConfig), so two forms can carry different
//! registries without sharing any global state.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FormError, FormResult};

pub const NOT_EMPTY: &str = ".+";
pub const NOT_EMPTY_NOR_SPACE: &str = r"^[^ \n]+.*$";
pub const NUMBER: &str = r"^-?\d+(?:\.\d+)?$";
pub const POSITIVE_NUMBER: &str = r"^\d+(?:\.\d+)?$";
pub const NEGATIVE_NUMBER: &str = r"^-\d+(?:\.\d+)?$";
pub const POSITIVE_INTEGER: &str = r"^\d+$";
pub const NEGATIVE_INTEGER: &str = r"^-\d+$";

/// RFC 5322 style address pattern with literal domain dots. The
/// address-literal branch keeps the overlapping `\x21-\x5a\x53-\x7f` class
/// of the widely copied original.
pub const EMAIL_ADDRESS: &str = r#"(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])"#;

/// Rule used when neither a field rule nor a general rule is known
static FALLBACK_RULE: Lazy<Rule> = Lazy::new(|| {
    Rule::new(NOT_EMPTY_NOR_SPACE).expect("built-in fallback pattern must compile")
});

/// A compiled validation pattern
///
/// Values are tested with an unanchored search, so a pattern that must
/// cover the whole value has to carry its own `^`/`$`.
#[derive(Clone)]
pub struct Rule {
    regex: Regex,
}

impl Rule {
    pub fn new(pattern: &str) -> FormResult<Self> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| FormError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// The "not empty, not starting with whitespace" rule
    pub fn fallback() -> Self {
        FALLBACK_RULE.clone()
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn test(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for Rule {}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rule").field(&self.pattern()).finish()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Named rule patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRegistry {
    patterns: BTreeMap<String, String>,
}

impl RuleRegistry {
    /// Registry holding only the built-in presets
    pub fn builtin() -> Self {
        let patterns = [
            ("not-empty", NOT_EMPTY),
            ("not-empty-nor-space", NOT_EMPTY_NOR_SPACE),
            ("number", NUMBER),
            ("positive-number", POSITIVE_NUMBER),
            ("negative-number", NEGATIVE_NUMBER),
            ("positive-integer", POSITIVE_INTEGER),
            ("negative-integer", NEGATIVE_INTEGER),
            ("email-address", EMAIL_ADDRESS),
        ]
        .into_iter()
        .map(|(name, pattern)| (name.to_string(), pattern.to_string()))
        .collect();

        Self { patterns }
    }

    /// Add (or override) a named rule. The pattern is compiled once here so
    /// a broken preset is reported when it is declared.
    pub fn with_preset(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
    ) -> FormResult<Self> {
        let pattern = pattern.into();
        Rule::new(&pattern)?;
        self.patterns.insert(name.into(), pattern);
        Ok(self)
    }

    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.patterns.get(name).map(String::as_str)
    }

    /// Compile the named rule
    pub fn rule(&self, name: &str) -> FormResult<Rule> {
        let pattern = self
            .pattern(name)
            .ok_or_else(|| FormError::UnknownPreset(name.to_string()))?;
        Rule::new(pattern)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patterns
            .iter()
            .map(|(name, pattern)| (name.as_str(), pattern.as_str()))
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
