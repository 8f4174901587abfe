//! In-memory password generator page
//!
//! [`StubGeneratorPage`] implements [`UiDriver`] for the generator widget
//! only. It reproduces the timing that makes polling necessary: the password
//! input is missing for a moment after navigation, and every regeneration
//! shows up only after a latency, the previous value staying visible until
//! then.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::debug;

use crate::driver::{DriverError, DriverResult, UiDriver};
use crate::generator::{CharacterClass, CharacterMode};
use crate::locators::generator as loc;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*";
const AMBIGUOUS: &str = "l1O0";

/// Timing and randomness of the stub page
#[derive(Debug, Clone)]
pub struct StubConfig {
    pub seed: u64,
    /// Time from navigation until the widget is attached
    pub render_delay: Duration,
    /// Time from a triggering action until the new password is visible
    pub latency: Duration,
    pub default_length: usize,
    pub max_length: usize,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            render_delay: Duration::from_millis(300),
            latency: Duration::from_millis(1200),
            default_length: 12,
            max_length: 50,
        }
    }
}

struct PageState {
    loaded_at: Option<Instant>,
    length: usize,
    typed_length: Option<String>,
    mode: CharacterMode,
    checked: [bool; 4],
    enabled: [bool; 4],
    shown: String,
    pending: Option<(Instant, String)>,
    generations: usize,
    rng: StdRng,
}

impl PageState {
    fn settle(&mut self, now: Instant) {
        if let Some((at, _)) = &self.pending {
            if *at <= now {
                if let Some((_, value)) = self.pending.take() {
                    self.shown = value;
                }
            }
        }
    }

    fn apply_mode(&mut self, mode: CharacterMode) {
        self.mode = mode;
        match mode {
            CharacterMode::EasyToSay => {
                self.checked = [true, true, false, false];
                self.enabled = [true, true, false, false];
            }
            CharacterMode::EasyToRead | CharacterMode::AllCharacters => {
                self.checked = [true; 4];
                self.enabled = [true; 4];
            }
        }
    }

    fn pool(&self, class: CharacterClass) -> Vec<char> {
        let chars = match class {
            CharacterClass::Uppercase => UPPER,
            CharacterClass::Lowercase => LOWER,
            CharacterClass::Numbers => DIGITS,
            CharacterClass::Symbols => SYMBOLS,
        };
        chars
            .chars()
            .filter(|c| self.mode != CharacterMode::EasyToRead || !AMBIGUOUS.contains(*c))
            .collect()
    }

    fn generate(&mut self) -> String {
        let pools: Vec<Vec<char>> = CharacterClass::ALL
            .iter()
            .enumerate()
            .filter(|(i, _)| self.checked[*i])
            .map(|(_, class)| self.pool(*class))
            .collect();
        let all: Vec<char> = pools.iter().flatten().copied().collect();

        // One character from each class first so every class shows up
        let mut chars: Vec<char> = (0..self.length)
            .map(|i| {
                let pool = pools.get(i).unwrap_or(&all);
                pool[self.rng.gen_range(0..pool.len())]
            })
            .collect();
        chars.shuffle(&mut self.rng);
        chars.into_iter().collect()
    }

    fn regenerate(&mut self, now: Instant, latency: Duration) {
        let pending = self.pending.as_ref().map(|(_, v)| v.clone());
        let mut next = self.generate();
        while next == self.shown || Some(&next) == pending.as_ref() {
            next = self.generate();
        }
        self.generations += 1;
        debug!(generation = self.generations, length = self.length, "Stub scheduled new password");
        self.pending = Some((now + latency, next));
    }
}

/// Generator widget simulated in memory
pub struct StubGeneratorPage {
    config: StubConfig,
    state: Mutex<PageState>,
}

impl Default for StubGeneratorPage {
    fn default() -> Self {
        Self::new(StubConfig::default())
    }
}

impl StubGeneratorPage {
    pub fn new(config: StubConfig) -> Self {
        let mut state = PageState {
            loaded_at: None,
            length: config.default_length,
            typed_length: None,
            mode: CharacterMode::AllCharacters,
            checked: [true; 4],
            enabled: [true; 4],
            shown: String::new(),
            pending: None,
            generations: 0,
            rng: StdRng::seed_from_u64(config.seed),
        };
        state.apply_mode(CharacterMode::AllCharacters);
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Number of passwords generated since creation
    pub fn generations(&self) -> usize {
        self.state.lock().generations
    }

    pub fn mode(&self) -> CharacterMode {
        self.state.lock().mode
    }

    fn class_index(locator: &str) -> Option<usize> {
        CharacterClass::ALL.iter().position(|c| c.label() == locator)
    }

    fn mode_for(locator: &str) -> Option<CharacterMode> {
        CharacterMode::ALL.into_iter().find(|m| m.label() == locator)
    }

    fn is_known(locator: &str) -> bool {
        matches!(
            locator,
            loc::PASSWORD_INPUT | loc::LENGTH_INPUT | loc::REFRESH_BUTTON | loc::COPY_PASSWORD_BUTTON
        ) || Self::class_index(locator).is_some()
            || Self::mode_for(locator).is_some()
    }

    /// Lock the page after checking that `locator` is rendered
    fn rendered(&self, locator: &str) -> DriverResult<parking_lot::MutexGuard<'_, PageState>> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let ready = state
            .loaded_at
            .is_some_and(|at| now >= at + self.config.render_delay);
        if !ready || !Self::is_known(locator) {
            return Err(DriverError::ElementNotFound(locator.to_string()));
        }
        state.settle(now);
        Ok(state)
    }

    fn action_error(action: &str, locator: &str, reason: &str) -> DriverError {
        DriverError::Action {
            action: action.to_string(),
            locator: locator.to_string(),
            reason: reason.to_string(),
        }
    }

    fn set_class(&self, locator: &str, value: Option<bool>, action: &str) -> DriverResult<()> {
        let index = Self::class_index(locator)
            .ok_or_else(|| Self::action_error(action, locator, "not a checkbox"))?;
        let mut state = self.rendered(locator)?;
        if !state.enabled[index] {
            return Err(Self::action_error(action, locator, "element is disabled"));
        }

        let target = value.unwrap_or(!state.checked[index]);
        if target == state.checked[index] {
            return Ok(());
        }
        if !target && state.checked.iter().filter(|c| **c).count() == 1 {
            return Err(Self::action_error(action, locator, "at least one class must stay selected"));
        }

        state.checked[index] = target;
        state.regenerate(Instant::now(), self.config.latency);
        Ok(())
    }
}

#[async_trait]
impl UiDriver for StubGeneratorPage {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("Stub: navigating to {}", url);
        let now = Instant::now();
        let mut state = self.state.lock();
        state.loaded_at = Some(now);
        state.length = self.config.default_length;
        state.typed_length = None;
        state.shown = String::new();
        state.pending = None;
        state.apply_mode(CharacterMode::AllCharacters);
        state.regenerate(now + self.config.render_delay, self.config.latency);
        Ok(())
    }

    async fn read_text(&self, locator: &str) -> DriverResult<String> {
        let state = self.rendered(locator)?;
        if locator == loc::PASSWORD_INPUT {
            Ok(state.shown.clone())
        } else {
            Ok(String::new())
        }
    }

    async fn read_value(&self, locator: &str) -> DriverResult<String> {
        let state = self.rendered(locator)?;
        match locator {
            loc::PASSWORD_INPUT => Ok(state.shown.clone()),
            loc::LENGTH_INPUT => Ok(state
                .typed_length
                .clone()
                .unwrap_or_else(|| state.length.to_string())),
            _ => Err(Self::action_error("read_value", locator, "not an input")),
        }
    }

    async fn fill(&self, locator: &str, value: &str) -> DriverResult<()> {
        let mut state = self.rendered(locator)?;
        if locator != loc::LENGTH_INPUT {
            return Err(Self::action_error("fill", locator, "not editable"));
        }
        state.typed_length = Some(value.to_string());
        Ok(())
    }

    async fn press(&self, locator: &str, key: &str) -> DriverResult<()> {
        let mut state = self.rendered(locator)?;
        if locator != loc::LENGTH_INPUT || key != "Tab" {
            return Ok(());
        }
        if let Some(typed) = state.typed_length.take() {
            // The widget clamps whatever was typed into its range
            let requested: usize = typed.trim().parse().unwrap_or(self.config.default_length);
            state.length = requested.clamp(1, self.config.max_length);
            state.regenerate(Instant::now(), self.config.latency);
        }
        Ok(())
    }

    async fn click(&self, locator: &str) -> DriverResult<()> {
        if Self::class_index(locator).is_some() {
            return self.set_class(locator, None, "click");
        }

        let mut state = self.rendered(locator)?;
        if let Some(mode) = Self::mode_for(locator) {
            if mode != state.mode {
                state.apply_mode(mode);
                state.regenerate(Instant::now(), self.config.latency);
            }
        } else if locator == loc::REFRESH_BUTTON {
            state.regenerate(Instant::now(), self.config.latency);
        }
        Ok(())
    }

    async fn check(&self, locator: &str) -> DriverResult<()> {
        self.set_class(locator, Some(true), "check")
    }

    async fn uncheck(&self, locator: &str) -> DriverResult<()> {
        self.set_class(locator, Some(false), "uncheck")
    }

    async fn is_checked(&self, locator: &str) -> DriverResult<bool> {
        let state = self.rendered(locator)?;
        if let Some(index) = Self::class_index(locator) {
            return Ok(state.checked[index]);
        }
        match Self::mode_for(locator) {
            Some(mode) => Ok(mode == state.mode),
            None => Err(Self::action_error("is_checked", locator, "not checkable")),
        }
    }

    async fn is_enabled(&self, locator: &str) -> DriverResult<bool> {
        let state = self.rendered(locator)?;
        Ok(Self::class_index(locator).map_or(true, |index| state.enabled[index]))
    }

    async fn is_visible(&self, locator: &str) -> DriverResult<bool> {
        Ok(self.rendered(locator).is_ok())
    }

    async fn attribute(&self, locator: &str, _name: &str) -> DriverResult<Option<String>> {
        let _state = self.rendered(locator)?;
        Ok(None)
    }

    async fn count(&self, locator: &str) -> DriverResult<usize> {
        Ok(usize::from(self.rendered(locator).is_ok()))
    }

    async fn wait_for_selector(&self, locator: &str, timeout: Duration) -> DriverResult<()> {
        let timed_out = || DriverError::Timeout {
            locator: locator.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };

        let loaded_at = self.state.lock().loaded_at;
        let ready_at = match loaded_at {
            Some(at) if Self::is_known(locator) => at + self.config.render_delay,
            _ => return Err(timed_out()),
        };

        let now = Instant::now();
        if ready_at <= now {
            return Ok(());
        }
        if ready_at - now > timeout {
            tokio::time::sleep(timeout).await;
            return Err(timed_out());
        }
        tokio::time::sleep_until(ready_at).await;
        Ok(())
    }
}
