//! Portal workflows: log in, log out, account creation

use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Credentials, SuiteConfig};
use crate::driver::UiDriver;
use crate::error::{E2eError, E2eResult};
use crate::locators::{messages, portal as loc, vault};

/// Wait for `locator` and assert its text contains `expected`
pub(crate) async fn expect_text<D: UiDriver + ?Sized>(
    driver: &D,
    locator: &str,
    expected: &str,
    timeout_ms: u64,
) -> E2eResult<String> {
    driver
        .wait_for_selector(locator, Duration::from_millis(timeout_ms))
        .await?;
    let text = driver.read_text(locator).await?;
    if !text.contains(expected) {
        return Err(E2eError::AssertionFailed(format!(
            "{} shows {:?}, expected it to contain {:?}",
            locator, text, expected
        )));
    }
    Ok(text)
}

/// Sign-up form contents
#[derive(Debug, Clone)]
pub struct AccountForm {
    pub email: String,
    pub password: String,
    /// Confirmation typed into the second password field; the password when unset
    pub confirmation: Option<String>,
    pub reminder: Option<String>,
}

impl AccountForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirmation: None,
            reminder: None,
        }
    }

    pub fn with_reminder(mut self, reminder: impl Into<String>) -> Self {
        self.reminder = Some(reminder.into());
        self
    }

    pub fn with_confirmation(mut self, confirmation: impl Into<String>) -> Self {
        self.confirmation = Some(confirmation.into());
        self
    }
}

/// Drives the marketing site and its log in form
pub struct Portal<'a, D: UiDriver + ?Sized> {
    driver: &'a D,
    config: &'a SuiteConfig,
}

impl<'a, D: UiDriver + ?Sized> Portal<'a, D> {
    pub fn new(driver: &'a D, config: &'a SuiteConfig) -> Self {
        Self { driver, config }
    }

    /// Open the portal, dismissing the promo popup when it shows up
    pub async fn go_to_portal(&self) -> E2eResult<()> {
        info!("Opening portal at {}", self.config.portal_url);
        self.driver.navigate(&self.config.portal_url).await?;

        let popup = self
            .driver
            .wait_for_selector(loc::PROMO_CLOSE_BUTTON, Duration::from_millis(self.config.timers.popup_ms))
            .await;
        match popup {
            Ok(()) => self.driver.click(loc::PROMO_CLOSE_BUTTON).await?,
            Err(_) => info!("No promo popup, continuing"),
        }

        self.driver
            .wait_for_selector(loc::LOG_IN_LINK, Duration::from_millis(self.config.timers.page_ready_ms))
            .await?;
        Ok(())
    }

    pub async fn open_create_account(&self) -> E2eResult<()> {
        self.go_to_portal().await?;
        self.driver.click(loc::LOG_IN_LINK).await?;
        self.driver.click(loc::CREATE_ACCOUNT_BUTTON).await?;
        Ok(())
    }

    async fn fill_settled(&self, locator: &str, value: &str) -> E2eResult<()> {
        self.driver.fill(locator, value).await?;
        self.driver.sleep(self.config.timers.settle_ms).await;
        Ok(())
    }

    async fn submit_account(&self, form: &AccountForm) -> E2eResult<()> {
        self.open_create_account().await?;
        info!(email = %form.email, "Creating account");

        self.fill_settled(loc::EMAIL_INPUT, &form.email).await?;
        self.fill_settled(loc::MASTER_PASSWORD_INPUT, &form.password).await?;
        let confirmation = form.confirmation.as_deref().unwrap_or(&form.password);
        self.fill_settled(loc::CONFIRM_PASSWORD_INPUT, confirmation).await?;
        if let Some(reminder) = &form.reminder {
            self.fill_settled(loc::REMINDER_INPUT, reminder).await?;
        }

        self.driver
            .wait_for_selector(loc::SIGN_UP_BUTTON, Duration::from_millis(self.config.timers.action_ms))
            .await?;
        self.driver.click(loc::SIGN_UP_BUTTON).await?;
        Ok(())
    }

    /// Submit the sign-up form and expect the success alert
    pub async fn create_account(&self, form: &AccountForm) -> E2eResult<String> {
        self.submit_account(form).await?;
        expect_text(
            self.driver,
            loc::ACCOUNT_CREATED_ALERT,
            messages::ACCOUNT_CREATED,
            self.config.timers.page_ready_ms,
        )
        .await
    }

    /// Submit the sign-up form and expect the general error banner
    pub async fn create_account_rejected(&self, form: &AccountForm, expected: &str) -> E2eResult<String> {
        self.submit_account(form).await?;
        expect_text(self.driver, loc::GENERAL_ERROR, expected, self.config.timers.action_ms).await
    }

    /// Type an email, tab out and expect the inline email error
    pub async fn email_rejected(&self, email: &str, expected: &str) -> E2eResult<String> {
        self.open_create_account().await?;
        self.driver.fill(loc::EMAIL_INPUT, email).await?;
        self.driver.press(loc::EMAIL_INPUT, "Tab").await?;
        expect_text(self.driver, loc::EMAIL_ERROR, expected, self.config.timers.action_ms).await
    }

    /// Type mismatching passwords and expect the inline confirmation error
    pub async fn confirmation_rejected(&self, form: &AccountForm) -> E2eResult<String> {
        self.open_create_account().await?;
        for (locator, value) in [
            (loc::EMAIL_INPUT, form.email.as_str()),
            (loc::MASTER_PASSWORD_INPUT, form.password.as_str()),
            (loc::CONFIRM_PASSWORD_INPUT, form.confirmation.as_deref().unwrap_or_default()),
        ] {
            self.driver.fill(locator, value).await?;
            self.driver.press(locator, "Tab").await?;
        }
        expect_text(
            self.driver,
            loc::CONFIRM_PASSWORD_ERROR,
            messages::CREATE_ACCOUNT_ERROR_FOR_PWD_MISMATCH,
            self.config.timers.action_ms,
        )
        .await
    }

    /// Open the log in form, type credentials and submit
    pub async fn fill_login(&self, username: &str, password: &str) -> E2eResult<()> {
        self.go_to_portal().await?;
        self.driver.click(loc::LOG_IN_LINK).await?;

        debug!(username, "Submitting log in form");
        self.driver.fill(loc::USERNAME_INPUT, username).await?;
        self.driver.fill(loc::PASSWORD_INPUT, password).await?;
        self.driver.click(loc::LOG_IN_BUTTON).await?;
        Ok(())
    }

    /// Log in and expect the vault's user menu to show the username
    ///
    /// The vault displays addresses in lowercase, whatever case was typed.
    pub async fn login(&self, credentials: &Credentials) -> E2eResult<()> {
        info!(username = %credentials.username, "Logging in");
        self.fill_login(&credentials.username, &credentials.password).await?;
        expect_text(
            self.driver,
            &vault::in_frame(vault::USER_MENU),
            &credentials.username.to_lowercase(),
            self.config.timers.page_ready_ms,
        )
        .await?;
        Ok(())
    }

    /// Log in and expect the form to show `expected`
    pub async fn login_rejected(&self, username: &str, password: &str, expected: &str) -> E2eResult<String> {
        self.fill_login(username, password).await?;
        expect_text(self.driver, loc::LOGIN_ERROR, expected, self.config.timers.action_ms).await
    }

    /// Log out through the user menu and land back on the portal
    pub async fn logout(&self) -> E2eResult<()> {
        info!("Logging out");
        self.driver.click(&vault::in_frame(vault::USER_MENU)).await?;

        // The menu animates in; clicking early hits the entry underneath
        let logout = vault::in_frame(vault::LOGOUT_ICON);
        self.driver
            .wait_for_selector(&logout, Duration::from_millis(self.config.timers.action_ms))
            .await?;
        if !self.driver.is_visible(&logout).await? {
            return Err(E2eError::AssertionFailed("log out entry is not visible".to_string()));
        }
        self.driver.click(&logout).await?;

        self.driver
            .wait_for_selector(loc::LOG_IN_LINK, Duration::from_millis(self.config.timers.action_ms))
            .await?;
        Ok(())
    }
}
