//! Error types for pwcheck core

use thiserror::Error;

/// Result type alias using the pwcheck core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures of the core.
///
/// Expected variability (a slow generator, a missing element while the
/// page renders, a rule that does not hold) is reported as data through
/// [`crate::PollOutcome`] and [`crate::ValidationOutcome`], never through
/// this type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Invalid pattern for rule {rule}: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid rule entry: {0}")]
    InvalidRuleEntry(String),
}
