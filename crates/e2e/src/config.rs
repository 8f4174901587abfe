//! Suite configuration

use std::path::Path;

use pwcheck_common::PollConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Configuration shared by every workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Marketing site hosting log in and account creation
    pub portal_url: String,

    /// Password generator page
    pub generator_url: String,

    /// Length the generator shows on first load
    pub default_password_length: usize,

    /// Longest password the generator accepts
    pub max_password_length: usize,

    /// Timers
    pub timers: TimerConfig,

    /// Account used by login and vault workflows
    pub credentials: Option<Credentials>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            portal_url: "https://www.lastpass.com".to_string(),
            generator_url: "https://www.lastpass.com/features/password-generator".to_string(),
            default_password_length: 12,
            max_password_length: 50,
            timers: TimerConfig::default(),
            credentials: None,
        }
    }
}

/// Waits and pauses used by the workflows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Waiting for a generated password to reach its length
    pub generate: PollConfig,

    /// Waiting for a page's landmark element
    pub page_ready_ms: u64,

    /// Waiting for an element before acting on it
    pub action_ms: u64,

    /// Waiting for the optional promo popup
    pub popup_ms: u64,

    /// Pause after filling a form field
    pub settle_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            generate: PollConfig::default(),
            page_ready_ms: 15_000,
            action_ms: 10_000,
            popup_ms: 5_000,
            settle_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl SuiteConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `PWCHECK_*` environment overrides
    pub fn with_env_overrides(self) -> E2eResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, `PWCHECK_*` keys
    pub fn with_overrides<F>(mut self, lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PWCHECK_PORTAL_URL") {
            self.portal_url = url;
        }
        if let Some(url) = lookup("PWCHECK_GENERATOR_URL") {
            self.generator_url = url;
        }
        if let Some(ms) = lookup("PWCHECK_GENERATE_TIMEOUT_MS") {
            self.timers.generate.timeout_ms = ms.parse().map_err(|_| {
                E2eError::InvalidConfig(format!("PWCHECK_GENERATE_TIMEOUT_MS is not a number: {ms}"))
            })?;
        }
        match (lookup("PWCHECK_USERNAME"), lookup("PWCHECK_PASSWORD")) {
            (Some(username), Some(password)) => {
                self.credentials = Some(Credentials { username, password });
            }
            (None, None) => {}
            _ => {
                return Err(E2eError::InvalidConfig(
                    "PWCHECK_USERNAME and PWCHECK_PASSWORD must be set together".to_string(),
                ))
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !self.timers.generate.is_valid() {
            return Err(E2eError::InvalidConfig(format!(
                "generate timer needs 0 < interval_ms <= timeout_ms (got {} / {})",
                self.timers.generate.interval_ms, self.timers.generate.timeout_ms
            )));
        }
        if self.timers.action_ms < self.timers.generate.interval_ms {
            return Err(E2eError::InvalidConfig(format!(
                "action_ms {} shorter than the generate interval {}",
                self.timers.action_ms, self.timers.generate.interval_ms
            )));
        }
        if self.default_password_length == 0 || self.default_password_length > self.max_password_length {
            return Err(E2eError::InvalidConfig(format!(
                "default_password_length {} outside 1..={}",
                self.default_password_length, self.max_password_length
            )));
        }
        Ok(())
    }

    /// Credentials, or an error naming the variables to set
    pub fn credentials(&self) -> E2eResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            E2eError::InvalidConfig(
                "no credentials configured (set PWCHECK_USERNAME and PWCHECK_PASSWORD)".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig::load(&dir.path().join("pwcheck.toml")).unwrap();
        assert_eq!(config.default_password_length, 12);
        assert_eq!(config.timers.generate, PollConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pwcheck.toml");
        std::fs::write(
            &path,
            r#"
generator_url = "http://127.0.0.1:8080/generator"

[timers]
settle_ms = 100

[timers.generate]
timeout_ms = 5000
"#,
        )
        .unwrap();

        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.generator_url, "http://127.0.0.1:8080/generator");
        assert_eq!(config.timers.settle_ms, 100);
        assert_eq!(config.timers.generate, PollConfig::from_millis(5000, 500));
        assert_eq!(config.timers.page_ready_ms, 15_000);
    }

    #[test]
    fn test_invalid_timer_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pwcheck.toml");
        std::fs::write(&path, "[timers.generate]\ninterval_ms = 0\n").unwrap();

        assert!(matches!(SuiteConfig::load(&path), Err(E2eError::InvalidConfig(_))));
    }

    #[test]
    fn test_action_timer_shorter_than_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pwcheck.toml");
        std::fs::write(&path, "[timers]\naction_ms = 200\n\n[timers.generate]\ninterval_ms = 500\n").unwrap();

        assert!(matches!(SuiteConfig::load(&path), Err(E2eError::InvalidConfig(_))));

        let mut config = SuiteConfig::default();
        config.timers.action_ms = config.timers.generate.interval_ms;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("PWCHECK_GENERATOR_URL", "http://localhost/gen"),
            ("PWCHECK_GENERATE_TIMEOUT_MS", "2000"),
            ("PWCHECK_USERNAME", "tester@example.com"),
            ("PWCHECK_PASSWORD", "secret"),
        ]
        .into_iter()
        .collect();

        let config = SuiteConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.generator_url, "http://localhost/gen");
        assert_eq!(config.timers.generate.timeout_ms, 2000);
        assert_eq!(config.credentials().unwrap().username, "tester@example.com");
    }

    #[test]
    fn test_half_credentials_rejected() {
        let result = SuiteConfig::default()
            .with_overrides(|key| (key == "PWCHECK_USERNAME").then(|| "someone".to_string()));
        assert!(matches!(result, Err(E2eError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_credentials() {
        assert!(SuiteConfig::default().credentials().is_err());
    }
}
