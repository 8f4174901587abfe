//! Element locators and expected application messages
//!
//! Locators use Playwright selector syntax (`role=`, CSS, XPath). Elements
//! inside the vault iframe are addressed through [`vault::in_frame`].

/// Password generator widget
pub mod generator {
    pub const PASSWORD_INPUT: &str = "#GENERATED-PASSWORD";
    pub const LENGTH_INPUT: &str = "#lp-pg-password-length";

    pub const EASY_TO_SAY_LABEL: &str = "//label[@for='lp-pg-easy-to-say']";
    pub const EASY_TO_READ_LABEL: &str = "//label[@for='lp-pg-easy-to-read']";
    pub const ALL_CHARACTERS_LABEL: &str = "//label[@for='lp-pg-all-characters']";

    pub const UPPERCASE_LABEL: &str = "//label[@for='lp-pg-uppercase']";
    pub const LOWERCASE_LABEL: &str = "//label[@for='lp-pg-lowercase']";
    pub const NUMBERS_LABEL: &str = "//label[@for='lp-pg-numbers']";
    pub const SYMBOLS_LABEL: &str = "//label[@for='lp-pg-symbols']";

    pub const REFRESH_BUTTON: &str =
        "//form[@id='GENERATED-PASSWORD-FORM']/following-sibling::div[1]/button[2]";

    /// Visible once the widget finished loading
    pub const COPY_PASSWORD_BUTTON: &str = r#"role=button[name="Copy Password"]"#;
}

/// Marketing site: log in and account creation
pub mod portal {
    pub const PROMO_CLOSE_BUTTON: &str = r#"[aria-label="close"]"#;
    pub const LOG_IN_LINK: &str = r#"role=link[name="Log In"]"#;
    pub const CREATE_ACCOUNT_BUTTON: &str = r#"role=button[name="Create an Account"]"#;

    pub const EMAIL_INPUT: &str = "#email";
    pub const MASTER_PASSWORD_INPUT: &str = "#masterpassword";
    pub const CONFIRM_PASSWORD_INPUT: &str = "#confirmmpw";
    pub const REMINDER_INPUT: &str = "#passwordreminder";
    pub const SIGN_UP_BUTTON: &str = r#"role=button[name="Sign Up - It's Free"]"#;

    pub const ACCOUNT_CREATED_ALERT: &str = "//div[@class='lp-alert__desc']/p";
    pub const GENERAL_ERROR: &str = "//div[@class='ca-general-error']/div";
    pub const EMAIL_ERROR: &str = "//div[@class='email-error']/p";
    pub const CONFIRM_PASSWORD_ERROR: &str = "//div[@class='confirmpw-error']/p";

    pub const USERNAME_INPUT: &str = r#"#root input[name="username"]"#;
    pub const PASSWORD_INPUT: &str = r#"#root input[name="password"]"#;
    pub const LOG_IN_BUTTON: &str = r#"role=button[name="Log in"]"#;
    pub const LOGIN_ERROR: &str = r#"//span[@data-automation-id="error-message"]"#;
}

/// Vault application, rendered inside an iframe
pub mod vault {
    pub const FRAME: &str = "#newvault";

    pub const USER_MENU: &str = "#userMenuText";
    pub const LOGOUT_ICON: &str = "#logoutIcon";
    pub const ORDER_OPTION: &str = "#orderOption";
    pub const SORT_ORDER_OPTION: &str = "#sortOrderOption";
    pub const OPEN_ADD_DIALOG: &str = "#openAddDialog";
    pub const ADD_PASSWORD_CARD: &str = "//button[@class='addItemCard Password']";
    pub const ADD_MENU_BUTTON: &str = "#addMenuButtonDefault";
    pub const ITEM_LIST: &str = "#itemList";
    pub const ADVANCED_SETTINGS_BUTTON: &str = r#"role=button[name="Advanced Settings:"]"#;
    pub const ADVANCED_EDIT_BUTTON: &str = r#"role=button[name="Advance dropdown closed"]"#;
    pub const SAVE_BUTTON: &str = r#"role=button[name="Save"]"#;
    pub const CONFIRM_YES_BUTTON: &str = "//button[text()='Yes']";
    pub const EDIT_FOLDER_INPUT: &str = r#"input[name="folder"]"#;

    /// Any entry of the item list; none for a new account
    pub fn item_list_entries() -> String {
        in_frame(&format!("{} > *", ITEM_LIST))
    }

    /// Address `selector` inside the vault iframe
    pub fn in_frame(selector: &str) -> String {
        format!("{} >> internal:control=enter-frame >> {}", FRAME, selector)
    }

    pub fn menu_entry(label: &str) -> String {
        in_frame(&format!("//span[text()='{}']", label))
    }

    pub fn sort_option(label: &str) -> String {
        in_frame(&format!("//li[text() = '{}']", label))
    }

    /// Folder header whose text starts with the folder name, e.g. `Work (3)`
    pub fn folder_summary(folder: &str) -> String {
        in_frame(&format!("//div[contains(text(), '{}')] >> visible=true", folder))
    }

    pub fn folder_header(text: &str) -> String {
        in_frame(&format!("//div[text()='{}']", text))
    }

    pub fn folder_container(text: &str) -> String {
        in_frame(&format!("//div[text()='{}']/../..", text))
    }

    pub fn item_name(name: &str) -> String {
        in_frame(&format!("//p[text()='{}']", name))
    }

    pub fn item_edit_button(name: &str) -> String {
        in_frame(&format!(
            "//p[text()='{}']/../../..//button[@class='itemButton edit']",
            name
        ))
    }

    pub fn item_delete_button(name: &str) -> String {
        in_frame(&format!(
            "//p[text()='{}']/../../..//button[@class='itemButton delete']",
            name
        ))
    }

    /// Text field of the add-item dialog, e.g. `#siteDialogURL`
    pub fn site_field(key: &str) -> String {
        in_frame(&format!("#siteDialog{}", key))
    }

    /// Checkbox of the add-item dialog's advanced settings
    pub fn site_checkbox(key: &str) -> String {
        in_frame(&format!("//input[@id='siteDialog{}']", key))
    }

    /// Labelled field of the edit-item dialog
    pub fn edit_field(label: &str) -> String {
        in_frame(&format!(r#"internal:label="{}"s"#, label))
    }

    /// Toggle button of the edit-item dialog's advanced settings
    pub fn edit_toggle(name: &str) -> String {
        in_frame(&format!("button[name='{}']", name))
    }
}

/// Messages the application shows
pub mod messages {
    pub const LOGIN_ERROR_FOR_INVALID_PWD: &str = "Check your master password and try again.";
    pub const LOGIN_ERROR_FOR_INVALID_USER: &str =
        "You may have mistyped your email address. Try again.";

    pub const ACCOUNT_CREATED: &str = "Your account has been successfully created!";
    pub const CREATE_ACCOUNT_ERROR_FOR_GENERAL: &str =
        "Something doesn't look right. Please check that you've entered everything correctly.";
    pub const CREATE_ACCOUNT_ERROR_FOR_EMAIL_IN_USE: &str = "Email already in use.";
    pub const CREATE_ACCOUNT_ERROR_FOR_EMAIL_INVALID: &str = "Please enter a valid email address.";
    pub const CREATE_ACCOUNT_ERROR_FOR_PWD_MISMATCH: &str =
        "Make sure this matches your master password";
}
