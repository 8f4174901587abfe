//! Vault workflows: sorting, counting, adding, editing and deleting passwords
//!
//! The vault lives inside an iframe; every locator goes through
//! [`vault::in_frame`].

use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use pwcheck_common::{PollConfig, Poller};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SuiteConfig;
use crate::driver::UiDriver;
use crate::error::{E2eError, E2eResult};
use crate::locators::vault;
use crate::portal::expect_text;

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Left menu section holding password items
pub const PASSWORDS_SECTION: &str = "Passwords";

/// A password item as entered in the add dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordItem {
    pub url: Option<String>,
    pub name: String,
    pub folder: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notes: Option<String>,
    pub password_reprompt: Option<bool>,
    pub autologin: Option<bool>,
    pub disable_autofill: Option<bool>,
}

impl PasswordItem {
    pub fn new(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            ..Default::default()
        }
    }

    /// Text fields keyed by their add-dialog id suffix
    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("URL", self.url.as_deref()),
            ("Name", Some(self.name.as_str())),
            ("Group", Some(self.folder.as_str())),
            ("Username", self.username.as_deref()),
            ("Password", self.password.as_deref()),
            ("Notes", self.notes.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    fn flags(&self) -> Vec<(&'static str, bool)> {
        [
            ("PasswordReprompt", self.password_reprompt),
            ("Autologin", self.autologin),
            ("DisableAutofill", self.disable_autofill),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Fields to change on an existing item; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemChanges {
    pub url: Option<String>,
    pub name: Option<String>,
    pub folder: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notes: Option<String>,
    /// The edit dialog shows flags as buttons; `true` clicks them once
    pub toggle_password_reprompt: bool,
    pub toggle_autologin: bool,
    pub toggle_autofill: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Folder,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Label of the sort entry, e.g. `Folder (a-z)`
pub fn sort_label(key: SortKey, order: SortOrder) -> String {
    format!("{} {}", key, order)
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Folder => write!(f, "Folder"),
            SortKey::Name => write!(f, "Name"),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "(a-z)"),
            SortOrder::Descending => write!(f, "(z-a)"),
        }
    }
}

/// First integer in a folder header such as `Work (3)`
pub fn parse_item_count(header: &str) -> Option<usize> {
    FIRST_NUMBER.find(header)?.as_str().parse().ok()
}

/// Drives the vault of a logged in user
pub struct Vault<'a, D: UiDriver + ?Sized> {
    driver: &'a D,
    config: &'a SuiteConfig,
}

impl<'a, D: UiDriver + ?Sized> Vault<'a, D> {
    pub fn new(driver: &'a D, config: &'a SuiteConfig) -> Self {
        Self { driver, config }
    }

    fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timers.action_ms)
    }

    async fn fill_settled(&self, locator: &str, value: &str) -> E2eResult<()> {
        self.driver.fill(locator, value).await?;
        self.driver.sleep(self.config.timers.settle_ms).await;
        Ok(())
    }

    /// Sort the item list and check the sort indicator
    pub async fn sort(&self, key: SortKey, order: SortOrder) -> E2eResult<()> {
        let label = sort_label(key, order);
        debug!(%label, "Sorting vault");

        let order_option = vault::in_frame(vault::ORDER_OPTION);
        self.driver.wait_for_selector(&order_option, self.action_timeout()).await?;
        self.driver.click(&order_option).await?;

        let option = vault::sort_option(&label);
        self.driver.wait_for_selector(&option, self.action_timeout()).await?;
        self.driver.click(&option).await?;

        expect_text(
            self.driver,
            &vault::in_frame(vault::SORT_ORDER_OPTION),
            &label,
            self.config.timers.action_ms,
        )
        .await?;
        Ok(())
    }

    /// Number of items of a section inside `folder`, read from the folder header
    pub async fn item_count_in_folder(
        &self,
        section: &str,
        key: SortKey,
        order: SortOrder,
        folder: &str,
    ) -> E2eResult<usize> {
        self.driver.click(&vault::menu_entry(section)).await?;
        self.sort(key, order).await?;

        let header = self.driver.read_text(&vault::folder_summary(folder)).await?;
        debug!(section, folder, %header, "Folder header");
        parse_item_count(&header).ok_or_else(|| {
            E2eError::AssertionFailed(format!("folder header {:?} has no item count", header))
        })
    }

    async fn password_count(&self, folder: &str) -> E2eResult<usize> {
        self.item_count_in_folder(PASSWORDS_SECTION, SortKey::Folder, SortOrder::Ascending, folder)
            .await
    }

    /// Whether the vault has no items at all
    pub async fn is_empty(&self) -> E2eResult<bool> {
        Ok(self.driver.count(&vault::item_list_entries()).await? == 0)
    }

    /// Add a password and check its folder grew by exactly one
    pub async fn add_password(&self, item: &PasswordItem) -> E2eResult<usize> {
        info!(name = %item.name, folder = %item.folder, "Adding password");

        let before = if self.is_empty().await? {
            self.driver.click(&vault::in_frame(vault::OPEN_ADD_DIALOG)).await?;
            self.driver.click(&vault::in_frame(vault::ADD_PASSWORD_CARD)).await?;
            0
        } else {
            let before = self.password_count(&item.folder).await?;
            let add = vault::in_frame(vault::ADD_MENU_BUTTON);
            self.driver.wait_for_selector(&add, self.action_timeout()).await?;
            self.driver.click(&add).await?;
            before
        };

        self.expand_advanced_settings().await?;
        for (key, value) in item.text_fields() {
            self.fill_settled(&vault::site_field(key), value).await?;
        }
        for (key, value) in item.flags() {
            let checkbox = vault::site_checkbox(key);
            if value {
                self.driver.check(&checkbox).await?;
            } else {
                self.driver.uncheck(&checkbox).await?;
            }
            self.driver.sleep(self.config.timers.settle_ms).await;
            if self.driver.is_checked(&checkbox).await? != value {
                return Err(E2eError::AssertionFailed(format!("{} checkbox did not change", key)));
            }
        }
        self.driver.click(&vault::in_frame(vault::SAVE_BUTTON)).await?;

        let after = self.password_count(&item.folder).await?;
        if after != before + 1 {
            return Err(E2eError::AssertionFailed(format!(
                "{} holds {} passwords after adding, expected {}",
                item.folder,
                after,
                before + 1
            )));
        }

        let header = vault::folder_header(&format!("{} ({})", item.folder, after));
        self.driver.wait_for_selector(&header, self.action_timeout()).await?;
        self.driver
            .wait_for_selector(&vault::item_name(&item.name), self.action_timeout())
            .await?;
        Ok(after)
    }

    async fn expand_advanced_settings(&self) -> E2eResult<()> {
        let button = vault::in_frame(vault::ADVANCED_SETTINGS_BUTTON);
        let expanded = self.driver.attribute(&button, "aria-expanded").await?;
        if expanded.as_deref() == Some("false") {
            self.driver.click(&button).await?;
        }
        Ok(())
    }

    /// Open `folder` when collapsed and wait for the item `name`
    pub async fn expand_folder(&self, folder: &str, name: &str) -> E2eResult<()> {
        let count = self.password_count(folder).await?;
        let header = format!("{} ({})", folder, count);

        let class = self
            .driver
            .attribute(&vault::folder_container(&header), "class")
            .await?
            .unwrap_or_default();
        if class.contains("closed") {
            debug!(folder, "Expanding folder");
            self.driver.click(&vault::folder_header(&header)).await?;
        }

        self.driver
            .wait_for_selector(&vault::item_name(name), self.action_timeout())
            .await?;
        Ok(())
    }

    /// Edit the item `name` in `folder` and wait for its new name
    pub async fn edit_password(&self, folder: &str, name: &str, changes: &ItemChanges) -> E2eResult<()> {
        info!(name, folder, "Editing password");
        self.expand_folder(folder, name).await?;
        self.driver.click(&vault::item_edit_button(name)).await?;
        self.driver.click(&vault::in_frame(vault::ADVANCED_EDIT_BUTTON)).await?;

        let labelled = [
            ("URL", &changes.url),
            ("Name", &changes.name),
            ("Username", &changes.username),
            ("Site password", &changes.password),
            ("Notes", &changes.notes),
        ];
        for (label, value) in labelled {
            if let Some(value) = value {
                self.fill_settled(&vault::edit_field(label), value).await?;
            }
        }
        if let Some(folder) = &changes.folder {
            self.fill_settled(&vault::in_frame(vault::EDIT_FOLDER_INPUT), folder).await?;
        }

        let toggles = [
            ("passwordProtected", changes.toggle_password_reprompt),
            ("autoLogin", changes.toggle_autologin),
            ("autoFill", changes.toggle_autofill),
        ];
        for (button, toggle) in toggles {
            if toggle {
                self.driver.click(&vault::edit_toggle(button)).await?;
                self.driver.sleep(self.config.timers.settle_ms).await;
            }
        }

        self.driver.click(&vault::in_frame(vault::SAVE_BUTTON)).await?;

        let new_name = changes.name.as_deref().unwrap_or(name);
        self.driver
            .wait_for_selector(&vault::item_name(new_name), self.action_timeout())
            .await?;
        Ok(())
    }

    /// Delete the item and wait until no item of that name is left
    pub async fn delete_password(&self, folder: &str, name: &str) -> E2eResult<()> {
        info!(name, folder, "Deleting password");
        self.expand_folder(folder, name).await?;
        self.driver.click(&vault::item_delete_button(name)).await?;

        let confirm = vault::in_frame(vault::CONFIRM_YES_BUTTON);
        self.driver.wait_for_selector(&confirm, self.action_timeout()).await?;
        self.driver.click(&confirm).await?;

        let item_locator = vault::item_name(name);
        let item = item_locator.as_str();
        let driver = self.driver;
        let timers = &self.config.timers;
        let poll = PollConfig::from_millis(timers.action_ms, timers.generate.interval_ms.min(timers.action_ms));
        let outcome = Poller::new(poll)
            .wait_until(move || driver.count(item), |count: &usize| *count == 0)
            .await;
        if !outcome.is_satisfied() {
            return Err(E2eError::AssertionFailed(format!(
                "{} still listed {} time(s) after delete",
                name,
                outcome.last_value().copied().unwrap_or_default()
            )));
        }
        Ok(())
    }
}
