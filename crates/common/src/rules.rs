//! Character-class rules and the string validator
//!
//! A [`RuleSet`] names the rules a generated password must honour, each
//! flagged "must be present" or "must be absent". The [`RuleRegistry`]
//! maps rule names to patterns; the process-wide [`RULE_REGISTRY`] holds the
//! standard classes. [`validate`] checks every rule and keeps every result,
//! so a failing password reports all of its mismatches at once.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{Error, Result};

pub const UPPERCASE: &str = "UPPERCASE";
pub const LOWERCASE: &str = "LOWERCASE";
pub const NUMBERS: &str = "NUMBERS";
pub const SYMBOLS: &str = "SYMBOLS";
pub const AMBIGUOUS_I_1_O_0: &str = "AMBIGUOUS_I_1_O_0";

/// Standard rule patterns. Each matches when the value *contains* at least
/// one character of the class.
pub const STANDARD_RULES: &[(&str, &str)] = &[
    (UPPERCASE, "[A-Z]"),
    (LOWERCASE, "[a-z]"),
    (NUMBERS, "[0-9]"),
    (SYMBOLS, "[^A-Za-z0-9_]"),
    (AMBIGUOUS_I_1_O_0, "[l1O0]"),
];

/// Registry of the standard rules, built on first use and never mutated.
pub static RULE_REGISTRY: Lazy<RuleRegistry> = Lazy::new(|| {
    RuleRegistry::from_patterns(STANDARD_RULES.iter().copied())
        .expect("standard rule patterns compile")
});

/// Shorthand for the process-wide registry
pub fn registry() -> &'static RuleRegistry {
    &RULE_REGISTRY
}

/// Rule name to pattern mapping
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    patterns: HashMap<String, Regex>,
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a registry from `(name, pattern)` pairs
    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        patterns
            .into_iter()
            .try_fold(Self::empty(), |registry, (name, pattern)| registry.with_rule(name, pattern))
    }

    /// Add or replace a rule. Used to register character classes beyond the
    /// standard five.
    pub fn with_rule(mut self, name: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            rule: name.to_string(),
            source,
        })?;
        self.patterns.insert(name.to_string(), regex);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Regex> {
        self.patterns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    /// Rule names in lexical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Fail on the first rule name this registry does not know.
    pub fn check(&self, rules: &RuleSet) -> Result<()> {
        match rules.iter().find(|(name, _)| !self.contains(name)) {
            Some((name, _)) => Err(Error::UnknownRule(name.to_string())),
            None => Ok(()),
        }
    }

    pub fn validate(&self, value: &str, rules: &RuleSet) -> Result<ValidationOutcome> {
        validate(value, rules, self)
    }
}

/// Ordered rule name to "must be present" mapping with unique names.
///
/// Serialized as a map; deserialization keeps the document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<(String, bool)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag for `name`. A repeated name keeps its first position.
    pub fn with(mut self, name: impl Into<String>, must_be_present: bool) -> Self {
        self.insert(name.into(), must_be_present);
        self
    }

    pub fn require(self, name: impl Into<String>) -> Self {
        self.with(name, true)
    }

    pub fn forbid(self, name: impl Into<String>) -> Self {
        self.with(name, false)
    }

    fn insert(&mut self, name: String, must_be_present: bool) {
        match self.rules.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = must_be_present,
            None => self.rules.push((name, must_be_present)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.rules
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, flag)| *flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.rules.iter().map(|(name, flag)| (name.as_str(), *flag))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse a `NAME=true|false` entry, as used on command lines.
    pub fn parse_entry(entry: &str) -> Result<(String, bool)> {
        let (name, flag) = entry
            .split_once('=')
            .ok_or_else(|| Error::InvalidRuleEntry(format!("{entry}: expected NAME=true|false")))?;
        let flag = match flag.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            other => {
                return Err(Error::InvalidRuleEntry(format!(
                    "{entry}: '{other}' is not a boolean"
                )))
            }
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidRuleEntry(format!("{entry}: empty rule name")));
        }
        Ok((name.to_string(), flag))
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for (name, flag) in iter {
            set.insert(name.into(), flag);
        }
        set
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for (name, flag) in &self.rules {
            map.serialize_entry(name, flag)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of rule names to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<RuleSet, A::Error> {
                let mut set = RuleSet::new();
                while let Some((name, flag)) = access.next_entry::<String, bool>()? {
                    if set.get(&name).is_some() {
                        return Err(serde::de::Error::custom(format!("duplicate rule {name}")));
                    }
                    set.insert(name, flag);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}

/// Result of checking one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub rule: String,
    pub expected_present: bool,
    pub matched: bool,
    pub passed: bool,
}

impl fmt::Display for RuleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = if self.expected_present { "present" } else { "absent" };
        let actual = if self.matched { "present" } else { "absent" };
        let status = if self.passed { "ok" } else { "MISMATCH" };
        write!(f, "{}: expected {}, found {} ({})", self.rule, expected, actual, status)
    }
}

/// Per-rule results in the order the rules were supplied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub checks: Vec<RuleCheck>,
}

impl ValidationOutcome {
    /// True when every rule passed
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn get(&self, rule: &str) -> Option<&RuleCheck> {
        self.checks.iter().find(|c| c.rule == rule)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        if failed == 0 {
            write!(f, "all {} rule(s) passed", self.checks.len())
        } else {
            let details: Vec<String> = self.failures().map(ToString::to_string).collect();
            write!(f, "{} of {} rule(s) failed: {}", failed, self.checks.len(), details.join("; "))
        }
    }
}

/// Check `value` against every rule in `rules`.
///
/// Fails only when a rule name is missing from `registry`; in that case no
/// partial outcome is returned.
pub fn validate(value: &str, rules: &RuleSet, registry: &RuleRegistry) -> Result<ValidationOutcome> {
    let mut checks = Vec::with_capacity(rules.len());

    for (name, must_be_present) in rules.iter() {
        let pattern = registry
            .get(name)
            .ok_or_else(|| Error::UnknownRule(name.to_string()))?;

        let matched = pattern.is_match(value);
        let passed = matched == must_be_present;
        debug!(rule = name, expected = must_be_present, matched, passed, "Rule checked");

        checks.push(RuleCheck {
            rule: name.to_string(),
            expected_present: must_be_present,
            matched,
            passed,
        });
    }

    Ok(ValidationOutcome { checks })
}
