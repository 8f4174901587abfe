//! Error types for E2E workflows

use thiserror::Error;

use crate::driver::DriverError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Rule error: {0}")]
    Rules(#[from] pwcheck_common::Error),

    #[error("Password of length {length} not generated within {timeout_ms} ms (last value: {last:?})")]
    GenerationTimeout {
        length: usize,
        timeout_ms: u64,
        last: Option<String>,
    },

    #[error("Password length {length} outside 1..={max}")]
    InvalidLength { length: usize, max: usize },

    #[error("Password rules not met: {0}")]
    RuleMismatch(pwcheck_common::ValidationOutcome),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
