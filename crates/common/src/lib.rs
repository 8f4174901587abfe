//! pwcheck core library
//!
//! Two pieces shared by every generator scenario:
//! - [`poll`]: wait for an asynchronously rendered value to satisfy a predicate
//! - [`rules`]: check a string against named character-class rules

pub mod error;
pub mod poll;
pub mod rules;

// Re-export commonly used types
pub use error::{Error, Result};
pub use poll::{length_equals, wait_until, PollConfig, PollOutcome, Poller};
pub use rules::{
    registry, validate, RuleCheck, RuleRegistry, RuleSet, ValidationOutcome, RULE_REGISTRY,
};

/// pwcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
