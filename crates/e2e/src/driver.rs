//! UI driver interface
//!
//! Workflows talk to the browser only through [`UiDriver`]. Locators are
//! opaque strings (CSS or XPath) interpreted by the implementation.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {timeout_ms} ms waiting for {locator}")]
    Timeout { locator: String, timeout_ms: u64 },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Action {action} on {locator} failed: {reason}")]
    Action {
        action: String,
        locator: String,
        reason: String,
    },
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Browser primitives consumed by the workflows
#[async_trait]
pub trait UiDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Visible text of an element
    async fn read_text(&self, locator: &str) -> DriverResult<String>;

    /// Current value of an input element
    async fn read_value(&self, locator: &str) -> DriverResult<String>;

    async fn fill(&self, locator: &str, value: &str) -> DriverResult<()>;

    /// Press a key while `locator` has focus
    async fn press(&self, locator: &str, key: &str) -> DriverResult<()>;

    async fn click(&self, locator: &str) -> DriverResult<()>;

    async fn check(&self, locator: &str) -> DriverResult<()>;

    async fn uncheck(&self, locator: &str) -> DriverResult<()>;

    async fn is_checked(&self, locator: &str) -> DriverResult<bool>;

    async fn is_enabled(&self, locator: &str) -> DriverResult<bool>;

    async fn is_visible(&self, locator: &str) -> DriverResult<bool>;

    async fn attribute(&self, locator: &str, name: &str) -> DriverResult<Option<String>>;

    /// Number of elements matching `locator`
    async fn count(&self, locator: &str) -> DriverResult<usize>;

    /// Wait until `locator` is attached, failing with [`DriverError::Timeout`]
    async fn wait_for_selector(&self, locator: &str, timeout: Duration) -> DriverResult<()>;

    async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
