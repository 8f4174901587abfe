//! Password generator page workflow
//!
//! Every action that makes the widget produce a new password (length, mode,
//! character classes, refresh) is followed by a wait on the password input:
//! the widget regenerates asynchronously and a single read races it.

use std::fmt;

use pwcheck_common::rules::{self, RuleSet, ValidationOutcome};
use pwcheck_common::{length_equals, PollOutcome, Poller};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SuiteConfig;
use crate::driver::UiDriver;
use crate::error::{E2eError, E2eResult};
use crate::locators::generator as loc;

/// Character-mode radio buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterMode {
    /// Pronounceable: letters only, numbers and symbols disabled
    EasyToSay,
    /// No ambiguous characters (`l`, `1`, `O`, `0`)
    EasyToRead,
    /// Every class available; the widget's initial mode
    #[default]
    AllCharacters,
}

impl CharacterMode {
    pub const ALL: [CharacterMode; 3] = [
        CharacterMode::EasyToSay,
        CharacterMode::EasyToRead,
        CharacterMode::AllCharacters,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CharacterMode::EasyToSay => loc::EASY_TO_SAY_LABEL,
            CharacterMode::EasyToRead => loc::EASY_TO_READ_LABEL,
            CharacterMode::AllCharacters => loc::ALL_CHARACTERS_LABEL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterMode::EasyToSay => "easy_to_say",
            CharacterMode::EasyToRead => "easy_to_read",
            CharacterMode::AllCharacters => "all_characters",
        }
    }
}

impl fmt::Display for CharacterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character-class checkboxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Uppercase,
    Lowercase,
    Numbers,
    Symbols,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 4] = [
        CharacterClass::Uppercase,
        CharacterClass::Lowercase,
        CharacterClass::Numbers,
        CharacterClass::Symbols,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CharacterClass::Uppercase => loc::UPPERCASE_LABEL,
            CharacterClass::Lowercase => loc::LOWERCASE_LABEL,
            CharacterClass::Numbers => loc::NUMBERS_LABEL,
            CharacterClass::Symbols => loc::SYMBOLS_LABEL,
        }
    }

    /// Name of the validator rule for this class
    pub fn rule(&self) -> &'static str {
        match self {
            CharacterClass::Uppercase => rules::UPPERCASE,
            CharacterClass::Lowercase => rules::LOWERCASE,
            CharacterClass::Numbers => rules::NUMBERS,
            CharacterClass::Symbols => rules::SYMBOLS,
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassState {
    pub checked: bool,
    pub enabled: bool,
}

/// Drives the generator widget through a [`UiDriver`]
pub struct GeneratorPage<'a, D: UiDriver + ?Sized> {
    driver: &'a D,
    config: &'a SuiteConfig,
    length: usize,
    mode: CharacterMode,
}

impl<'a, D: UiDriver + ?Sized> GeneratorPage<'a, D> {
    pub fn new(driver: &'a D, config: &'a SuiteConfig) -> Self {
        Self {
            driver,
            config,
            length: config.default_password_length,
            mode: CharacterMode::default(),
        }
    }

    /// Length the widget is currently set to
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn mode(&self) -> CharacterMode {
        self.mode
    }

    /// Load the page and wait for the initial password
    pub async fn open(&mut self) -> E2eResult<String> {
        info!("Opening password generator at {}", self.config.generator_url);
        self.driver.navigate(&self.config.generator_url).await?;
        self.driver
            .wait_for_selector(
                loc::COPY_PASSWORD_BUTTON,
                std::time::Duration::from_millis(self.config.timers.page_ready_ms),
            )
            .await?;

        self.length = self.config.default_password_length;
        self.mode = CharacterMode::default();
        self.expect_password(self.length).await
    }

    /// Wait for the password input to hold a value of `length` characters
    pub async fn wait_for_password(&self, length: usize) -> PollOutcome<String> {
        self.poll_password(length, None).await
    }

    async fn poll_password(&self, length: usize, previous: Option<&str>) -> PollOutcome<String> {
        let timer = self.config.timers.generate;
        let start = Instant::now();

        if let Err(e) = self.driver.wait_for_selector(loc::PASSWORD_INPUT, timer.timeout()).await {
            warn!(error = %e, "Password input never appeared");
            return PollOutcome::TimedOut {
                last_value: None,
                samples: 0,
                elapsed: start.elapsed(),
            };
        }

        // One deadline covers rendering and generation
        let spent = start.elapsed();
        let driver = self.driver;
        let has_length = length_equals::<String>(length);
        let outcome = Poller::new(timer.remaining_after(spent))
            .wait_until(
                move || driver.read_value(loc::PASSWORD_INPUT),
                |value: &String| has_length(value) && previous.map_or(true, |p| p != value.as_str()),
            )
            .await
            .delayed_by(spent);

        if let Some(value) = outcome.value() {
            debug!(length, password = %value, "Password generated");
        }
        outcome
    }

    /// Like [`Self::wait_for_password`], failing on timeout
    pub async fn expect_password(&self, length: usize) -> E2eResult<String> {
        self.expect(length, None).await
    }

    async fn expect(&self, length: usize, previous: Option<&str>) -> E2eResult<String> {
        match self.poll_password(length, previous).await {
            PollOutcome::Satisfied { value, .. } => Ok(value),
            outcome => Err(E2eError::GenerationTimeout {
                length,
                timeout_ms: self.config.timers.generate.timeout_ms,
                last: outcome.last_value().cloned(),
            }),
        }
    }

    /// Current value of the password input
    pub async fn password(&self) -> E2eResult<String> {
        Ok(self.driver.read_value(loc::PASSWORD_INPUT).await?)
    }

    /// Type a new length, tab out and wait for a password of that length
    pub async fn set_length(&mut self, length: usize) -> E2eResult<String> {
        let max = self.config.max_password_length;
        if length == 0 || length > max {
            return Err(E2eError::InvalidLength { length, max });
        }
        if length == self.length {
            debug!(length, "Length already set");
            return self.expect_password(length).await;
        }

        info!(length, "Setting password length");
        self.driver.fill(loc::LENGTH_INPUT, &length.to_string()).await?;
        self.driver.press(loc::LENGTH_INPUT, "Tab").await?;
        self.length = length;
        self.expect_password(length).await
    }

    /// Type raw text into the length input and let the widget clamp it
    ///
    /// Returns the length the widget settled on together with the password
    /// generated for it.
    pub async fn enter_length(&mut self, raw: &str) -> E2eResult<(usize, String)> {
        info!(raw, "Typing password length");
        self.driver.fill(loc::LENGTH_INPUT, raw).await?;
        self.driver.press(loc::LENGTH_INPUT, "Tab").await?;

        let shown = self.driver.read_value(loc::LENGTH_INPUT).await?;
        let length: usize = shown.trim().parse().map_err(|_| {
            E2eError::AssertionFailed(format!("length input holds a non-number: {shown:?}"))
        })?;
        if length == 0 || length > self.config.max_password_length {
            return Err(E2eError::InvalidLength {
                length,
                max: self.config.max_password_length,
            });
        }

        self.length = length;
        let password = self.expect_password(length).await?;
        Ok((length, password))
    }

    /// Pick a character mode and wait for the regenerated password
    pub async fn select_mode(&mut self, mode: CharacterMode) -> E2eResult<String> {
        info!(%mode, "Selecting character mode");
        let before = self.password().await?;
        self.driver.click(mode.label()).await?;

        // Re-selecting the active radio does not regenerate
        let previous = (mode != self.mode).then_some(before.as_str());
        self.mode = mode;
        self.expect(self.length, previous).await
    }

    pub async fn class_state(&self, class: CharacterClass) -> E2eResult<ClassState> {
        Ok(ClassState {
            checked: self.driver.is_checked(class.label()).await?,
            enabled: self.driver.is_enabled(class.label()).await?,
        })
    }

    /// Check or uncheck a character class and wait for the regenerated password
    pub async fn set_class(&self, class: CharacterClass, enabled: bool) -> E2eResult<String> {
        let before = self.password().await?;
        if self.driver.is_checked(class.label()).await? == enabled {
            debug!(%class, enabled, "Class already in requested state");
            return Ok(before);
        }

        info!(%class, enabled, "Toggling character class");
        if enabled {
            self.driver.check(class.label()).await?;
        } else {
            self.driver.uncheck(class.label()).await?;
        }

        let checked = self.driver.is_checked(class.label()).await?;
        if checked != enabled {
            return Err(E2eError::AssertionFailed(format!(
                "{} checkbox is {} after {}",
                class,
                if checked { "checked" } else { "unchecked" },
                if enabled { "check" } else { "uncheck" },
            )));
        }

        self.expect(self.length, Some(&before)).await
    }

    /// Click the refresh icon and wait for a different password
    pub async fn refresh(&self) -> E2eResult<String> {
        let before = self.password().await?;
        info!("Refreshing password");
        self.driver.click(loc::REFRESH_BUTTON).await?;

        let after = self.expect(self.length, Some(&before)).await?;
        if after == before {
            return Err(E2eError::AssertionFailed("refresh kept the same password".to_string()));
        }
        Ok(after)
    }
}

/// Validate a generated password against the process-wide rule registry
pub fn verify_rules(password: &str, rules: &RuleSet) -> E2eResult<ValidationOutcome> {
    let outcome = pwcheck_common::validate(password, rules, pwcheck_common::registry())?;
    if outcome.passed() {
        debug!(%outcome, "Password matches rules");
    } else {
        warn!(%outcome, "Password does not match rules");
    }
    Ok(outcome)
}

/// [`verify_rules`], turning any mismatch into [`E2eError::RuleMismatch`]
pub fn ensure_rules(password: &str, rules: &RuleSet) -> E2eResult<ValidationOutcome> {
    let outcome = verify_rules(password, rules)?;
    if outcome.passed() {
        Ok(outcome)
    } else {
        Err(E2eError::RuleMismatch(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwcheck_common::rules::{LOWERCASE, UPPERCASE};

    #[test]
    fn test_class_rules() {
        let names: Vec<&str> = CharacterClass::ALL.iter().map(|c| c.rule()).collect();
        assert_eq!(names, vec!["UPPERCASE", "LOWERCASE", "NUMBERS", "SYMBOLS"]);
        for name in names {
            assert!(pwcheck_common::registry().contains(name));
        }
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: CharacterMode = serde_yaml::from_str("easy_to_read").unwrap();
        assert_eq!(mode, CharacterMode::EasyToRead);
        assert_eq!(CharacterMode::default(), CharacterMode::AllCharacters);
    }

    #[test]
    fn test_ensure_rules_mismatch() {
        let rules = RuleSet::new().require(UPPERCASE).require(LOWERCASE);
        match ensure_rules("lowercase", &rules) {
            Err(E2eError::RuleMismatch(outcome)) => {
                assert_eq!(outcome.failures().count(), 1);
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
        assert!(ensure_rules("Mixed", &rules).is_ok());
    }

    #[test]
    fn test_unknown_rule_is_hard_error() {
        let rules = RuleSet::new().require("DIGITS");
        assert!(matches!(verify_rules("abc", &rules), Err(E2eError::Rules(_))));
    }
}
