//! PwCheck E2E workflows
//!
//! Password-manager workflows written against an abstract [`UiDriver`]:
//! - Drives the password generator and waits for each regenerated value
//! - Validates generated passwords against character-class rules
//! - Runs declarative YAML generator scenarios
//! - Logs in and out, creates accounts and manages vault items
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Workflows (this crate)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  GeneratorScenario (YAML)                                   │
//! │    └── execute(GeneratorPage) -> ScenarioResult             │
//! │  GeneratorPage                                              │
//! │    ├── open / set_length / select_mode / set_class          │
//! │    ├── refresh                                              │
//! │    └── wait_for_password ── Poller (pwcheck-common)         │
//! │  Portal: login / logout / create_account                    │
//! │  Vault:  sort / add / edit / delete password                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UiDriver (trait)                                           │
//! │    ├── browser binding (outside this crate)                 │
//! │    └── StubGeneratorPage (in memory)                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod generator;
pub mod locators;
pub mod portal;
pub mod scenario;
pub mod stub;
pub mod vault;

pub use config::{Credentials, SuiteConfig, TimerConfig};
pub use driver::{DriverError, DriverResult, UiDriver};
pub use error::{E2eError, E2eResult};
pub use generator::{ensure_rules, verify_rules, CharacterClass, CharacterMode, ClassState, GeneratorPage};
pub use portal::{AccountForm, Portal};
pub use scenario::{GeneratorScenario, ScenarioResult};
pub use stub::{StubConfig, StubGeneratorPage};
pub use vault::{ItemChanges, PasswordItem, SortKey, SortOrder, Vault};
