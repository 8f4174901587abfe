//! Declarative generator scenarios
//!
//! A scenario sets the length, picks a character mode, unchecks some classes,
//! optionally refreshes, and then validates the resulting password against a
//! rule set:
//!
//! ```yaml
//! name: easy-to-read-uppercase-only
//! tags: [easy_to_read]
//! length: 20
//! mode: easy_to_read
//! disable: [lowercase, numbers, symbols]
//! rules:
//!   UPPERCASE: true
//!   LOWERCASE: false
//!   AMBIGUOUS_I_1_O_0: false
//! ```

use std::path::Path;
use std::time::Instant;

use pwcheck_common::{RuleRegistry, RuleSet, ValidationOutcome};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::driver::UiDriver;
use crate::error::{E2eError, E2eResult};
use crate::generator::{verify_rules, CharacterClass, CharacterMode, GeneratorPage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorScenario {
    /// Unique name for this scenario
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Password length typed before anything else
    pub length: usize,

    #[serde(default)]
    pub mode: CharacterMode,

    /// Classes unchecked after the mode is selected, in order
    #[serde(default)]
    pub disable: Vec<CharacterClass>,

    /// Classes that must be checked once the mode is selected
    #[serde(default)]
    pub expect_checked: Vec<CharacterClass>,

    /// Classes that must be greyed out once the mode is selected
    #[serde(default)]
    pub expect_disabled: Vec<CharacterClass>,

    /// Refresh once before validating; the password must change
    #[serde(default)]
    pub refresh: bool,

    /// Expected presence of each rule in the final password
    pub rules: RuleSet,
}

/// Result of executing a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub password: Option<String>,
    pub outcome: Option<ValidationOutcome>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl GeneratorScenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all scenarios from a directory, sorted by file path.
    ///
    /// A missing or unreadable directory is an error, not an empty list.
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| E2eError::Io(e.into()))?;
            let is_yaml = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                scenarios.push(Self::from_file(entry.path())?);
            }
        }

        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Reject rule names the registry does not know and impossible lengths
    pub fn check_rules(&self, registry: &RuleRegistry, max_length: usize) -> E2eResult<()> {
        if self.length == 0 || self.length > max_length {
            return Err(E2eError::InvalidScenario(format!(
                "{}: length {} outside 1..={}",
                self.name, self.length, max_length
            )));
        }
        if self.rules.is_empty() {
            return Err(E2eError::InvalidScenario(format!("{}: no rules", self.name)));
        }
        registry.check(&self.rules)?;
        Ok(())
    }

    /// Drive the generator through this scenario and validate the result
    pub async fn execute<D: UiDriver + ?Sized>(&self, page: &mut GeneratorPage<'_, D>) -> ScenarioResult {
        let start = Instant::now();
        info!("Running scenario: {}", self.name);

        let (password, result) = match self.run(page).await {
            Ok(password) => {
                let result = verify_rules(&password, &self.rules);
                (Some(password), result)
            }
            Err(e) => (None, Err(e)),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => {
                let success = outcome.passed();
                if success {
                    info!("Scenario {} passed in {}ms", self.name, duration_ms);
                } else {
                    error!("Scenario {} failed: {}", self.name, outcome);
                }
                ScenarioResult {
                    name: self.name.clone(),
                    success,
                    password,
                    error: (!success).then(|| outcome.to_string()),
                    outcome: Some(outcome),
                    duration_ms,
                }
            }
            Err(e) => {
                error!("Scenario {} failed: {}", self.name, e);
                ScenarioResult {
                    name: self.name.clone(),
                    success: false,
                    password,
                    outcome: None,
                    duration_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn run<D: UiDriver + ?Sized>(&self, page: &mut GeneratorPage<'_, D>) -> E2eResult<String> {
        page.open().await?;
        page.set_length(self.length).await?;
        page.select_mode(self.mode).await?;

        for class in &self.expect_checked {
            if !page.class_state(*class).await?.checked {
                return Err(E2eError::AssertionFailed(format!(
                    "{} is not checked in {} mode",
                    class, self.mode
                )));
            }
        }
        for class in &self.expect_disabled {
            if page.class_state(*class).await?.enabled {
                return Err(E2eError::AssertionFailed(format!(
                    "{} is enabled in {} mode",
                    class, self.mode
                )));
            }
        }

        let mut password = page.password().await?;
        for class in &self.disable {
            password = page.set_class(*class, false).await?;
        }
        if self.refresh {
            password = page.refresh().await?;
        }
        Ok(password)
    }
}
