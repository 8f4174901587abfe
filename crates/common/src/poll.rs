//! Condition polling
//!
//! A [`Poller`] repeatedly samples a value from an external source (usually
//! an input rendered by a remote UI) until a predicate holds or a deadline
//! passes. Reads that fail while the source is still rendering count as
//! unsatisfied samples; only the deadline is terminal.
//!
//! ```text
//!            ┌──────────── sleep(interval) ◄───────────┐
//!            ▼                                         │
//!   start ─► Sampling ──satisfied──► Satisfied(value)  │
//!            │                                         │
//!            ├──elapsed >= timeout──► TimedOut(last)   │
//!            ├──token cancelled─────► Cancelled(last)  │
//!            └──otherwise──────────────────────────────┘
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default deadline for a generated value to settle.
///
/// Long passwords occasionally take tens of seconds to appear on a slow page.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default pause between two samples.
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// Timing bounds of a single wait operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Deadline measured from the first sample
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Pause between samples
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl PollConfig {
    pub fn from_millis(timeout_ms: u64, interval_ms: u64) -> Self {
        Self { timeout_ms, interval_ms }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// A config is usable when the interval is non-zero and fits in the timeout.
    pub fn is_valid(&self) -> bool {
        self.interval_ms > 0 && self.timeout_ms >= self.interval_ms
    }

    /// Upper bound on the number of samples a wait with this config takes.
    pub fn max_samples(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        self.timeout_ms.div_ceil(self.interval_ms) as usize + 1
    }

    /// What is left of this config once `spent` of the timeout is used up.
    ///
    /// The result always allows at least one sample: the timeout never drops
    /// below 1 ms and the interval is capped at the remaining timeout.
    pub fn remaining_after(&self, spent: Duration) -> Self {
        let spent_ms = u64::try_from(spent.as_millis()).unwrap_or(u64::MAX);
        let timeout_ms = self.timeout_ms.saturating_sub(spent_ms).max(1);
        Self {
            timeout_ms,
            interval_ms: self.interval_ms.min(timeout_ms),
        }
    }
}

/// Terminal state of a wait operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The predicate held for `value`
    Satisfied {
        value: T,
        samples: usize,
        elapsed: Duration,
    },

    /// The deadline passed first. `last_value` is the last successful read.
    TimedOut {
        last_value: Option<T>,
        samples: usize,
        elapsed: Duration,
    },

    /// The cancellation token fired between two samples
    Cancelled {
        last_value: Option<T>,
        samples: usize,
        elapsed: Duration,
    },
}

impl<T> PollOutcome<T> {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PollOutcome::Satisfied { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut { .. })
    }

    /// The satisfying value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            PollOutcome::Satisfied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            PollOutcome::Satisfied { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The most recent value read, satisfying or not
    pub fn last_value(&self) -> Option<&T> {
        match self {
            PollOutcome::Satisfied { value, .. } => Some(value),
            PollOutcome::TimedOut { last_value, .. } | PollOutcome::Cancelled { last_value, .. } => {
                last_value.as_ref()
            }
        }
    }

    pub fn samples(&self) -> usize {
        match self {
            PollOutcome::Satisfied { samples, .. }
            | PollOutcome::TimedOut { samples, .. }
            | PollOutcome::Cancelled { samples, .. } => *samples,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Satisfied { elapsed, .. }
            | PollOutcome::TimedOut { elapsed, .. }
            | PollOutcome::Cancelled { elapsed, .. } => *elapsed,
        }
    }

    /// Count `offset` of earlier waiting into the reported elapsed time
    pub fn delayed_by(mut self, offset: Duration) -> Self {
        match &mut self {
            PollOutcome::Satisfied { elapsed, .. }
            | PollOutcome::TimedOut { elapsed, .. }
            | PollOutcome::Cancelled { elapsed, .. } => *elapsed += offset,
        }
        self
    }
}

/// Polls an external source under a [`PollConfig`].
///
/// A poller holds no state between calls; one instance may serve any number
/// of sequential waits. Callers sharing one external source across tasks
/// must serialize access themselves.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    config: PollConfig,
    cancel: Option<CancellationToken>,
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Self { config, cancel: None }
    }

    /// Stop at the next iteration boundary once `token` is cancelled.
    /// An interval sleep already in progress is not interrupted.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Sample until `is_satisfied` holds, the deadline passes, or the
    /// cancellation token fires.
    ///
    /// The deadline is reached once `elapsed >= timeout_ms`, checked after each sample.
    pub async fn wait_until<T, E, S, Fut, P>(&self, mut sample: S, is_satisfied: P) -> PollOutcome<T>
    where
        S: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&T) -> bool,
    {
        let start = Instant::now();

        if !self.config.is_valid() {
            warn!(
                timeout_ms = self.config.timeout_ms,
                interval_ms = self.config.interval_ms,
                "Invalid poll configuration, giving up without sampling"
            );
            return PollOutcome::TimedOut {
                last_value: None,
                samples: 0,
                elapsed: start.elapsed(),
            };
        }

        let timeout = self.config.timeout();
        let interval = self.config.interval();
        let mut samples = 0;
        let mut last_value = None;

        loop {
            if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                debug!(samples, "Poll cancelled");
                return PollOutcome::Cancelled {
                    last_value,
                    samples,
                    elapsed: start.elapsed(),
                };
            }

            samples += 1;
            match sample().await {
                Ok(value) => {
                    if is_satisfied(&value) {
                        let elapsed = start.elapsed();
                        info!(samples, elapsed_ms = elapsed.as_millis() as u64, "Condition satisfied");
                        return PollOutcome::Satisfied {
                            value,
                            samples,
                            elapsed,
                        };
                    }
                    last_value = Some(value);
                }
                Err(e) => {
                    // Element not rendered yet and similar gaps
                    debug!(samples, error = %e, "Sample failed, treating as unsatisfied");
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!(samples, elapsed_ms = elapsed.as_millis() as u64, "Timed out waiting for condition");
                return PollOutcome::TimedOut {
                    last_value,
                    samples,
                    elapsed,
                };
            }

            sleep(interval).await;
        }
    }
}

/// Sample until `is_satisfied` holds or `config.timeout_ms` elapses.
pub async fn wait_until<T, E, S, Fut, P>(sample: S, is_satisfied: P, config: PollConfig) -> PollOutcome<T>
where
    S: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&T) -> bool,
{
    Poller::new(config).wait_until(sample, is_satisfied).await
}

/// Predicate: the value is exactly `len` characters long.
pub fn length_equals<S>(len: usize) -> impl Fn(&S) -> bool
where
    S: AsRef<str> + ?Sized,
{
    move |value: &S| value.as_ref().chars().count() == len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use test_case::test_case;

    fn sequence(values: &[&str]) -> impl FnMut() -> std::future::Ready<Result<String, Infallible>> {
        let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        let mut index = 0;
        move || {
            let value = values[index.min(values.len() - 1)].clone();
            index += 1;
            std::future::ready(Ok(value))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_after_three_samples() {
        let outcome = wait_until(
            sequence(&["", "ab", "abcd"]),
            length_equals(4),
            PollConfig::from_millis(2000, 500),
        )
        .await;

        assert!(outcome.is_satisfied());
        assert_eq!(outcome.value().map(String::as_str), Some("abcd"));
        assert_eq!(outcome.samples(), 3);
        assert!(outcome.elapsed() >= Duration::from_millis(1000));
        assert!(outcome.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_last_value() {
        let config = PollConfig::from_millis(2000, 500);
        let outcome = wait_until(sequence(&["ab"]), length_equals(4), config).await;

        match &outcome {
            PollOutcome::TimedOut { last_value, samples, elapsed } => {
                assert_eq!(last_value.as_deref(), Some("ab"));
                assert!(*samples <= config.max_samples());
                assert!(*elapsed >= config.timeout());
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test_case(0; "empty")]
    #[test_case(1; "single")]
    #[test_case(12; "default length")]
    #[test_case(50; "maximum")]
    #[tokio::test(start_paused = true)]
    async fn test_target_length(len: usize) {
        let target = "x".repeat(len);
        let outcome = wait_until(
            sequence(&["pending", &target]),
            length_equals(len),
            PollConfig::default(),
        )
        .await;

        assert_eq!(outcome.into_value(), Some(target));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reached_at_timeout() {
        let config = PollConfig::from_millis(2000, 500);
        let outcome = wait_until(sequence(&["never"]), length_equals(1), config).await;

        // Samples at 0, 500, 1000, 1500 and 2000 ms; no sample past the deadline
        assert_eq!(outcome.samples(), 5);
        assert_eq!(outcome.elapsed(), config.timeout());
    }

    #[test_case(2000, 500)]
    #[test_case(2100, 500)]
    #[test_case(1000, 300)]
    #[test_case(500, 500)]
    #[tokio::test(start_paused = true)]
    async fn test_sample_count_bounded(timeout_ms: u64, interval_ms: u64) {
        let config = PollConfig::from_millis(timeout_ms, interval_ms);
        let outcome = wait_until(sequence(&["never"]), length_equals(1), config).await;

        assert!(outcome.is_timed_out());
        assert!(outcome.samples() >= 1);
        assert!(
            outcome.samples() <= config.max_samples(),
            "{} samples exceeds bound {}",
            outcome.samples(),
            config.max_samples()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_are_not_terminal() {
        let mut calls = 0;
        let sampler = move || {
            calls += 1;
            let result = if calls < 3 {
                Err("element not found")
            } else {
                Ok("abcd".to_string())
            };
            std::future::ready(result)
        };

        let outcome = wait_until(sampler, length_equals(4), PollConfig::from_millis(5000, 500)).await;
        assert!(outcome.is_satisfied());
        assert_eq!(outcome.samples(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_errors_time_out_without_value() {
        let sampler = || std::future::ready(Err::<String, _>("element not found"));
        let outcome = wait_until(sampler, length_equals(4), PollConfig::from_millis(1000, 500)).await;

        assert!(outcome.is_timed_out());
        assert_eq!(outcome.last_value(), None);
    }

    #[test_case(1000, 0; "zero interval")]
    #[test_case(100, 500; "timeout shorter than interval")]
    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_never_samples(timeout_ms: u64, interval_ms: u64) {
        let mut calls = 0;
        let sampler = || {
            calls += 1;
            std::future::ready(Ok::<_, Infallible>(String::new()))
        };
        let outcome = wait_until(sampler, length_equals(0), PollConfig::from_millis(timeout_ms, interval_ms)).await;

        assert!(outcome.is_timed_out());
        assert_eq!(outcome.samples(), 0);
        assert_eq!(calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_at_iteration_boundary() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut calls = 0;
        let sampler = move || {
            calls += 1;
            if calls == 2 {
                trigger.cancel();
            }
            std::future::ready(Ok::<_, Infallible>("ab".to_string()))
        };

        let outcome = Poller::new(PollConfig::default())
            .with_cancellation(token)
            .wait_until(sampler, length_equals(4))
            .await;

        match outcome {
            PollOutcome::Cancelled { last_value, samples, .. } => {
                assert_eq!(samples, 2);
                assert_eq!(last_value.as_deref(), Some("ab"));
            }
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn test_config_defaults_and_bounds() {
        let config = PollConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.interval(), Duration::from_millis(500));
        assert_eq!(config.max_samples(), 121);
        assert_eq!(PollConfig::from_millis(2000, 500).max_samples(), 5);
        assert_eq!(PollConfig::from_millis(10, 0).max_samples(), 0);
    }

    #[test_case(0, PollConfig::from_millis(2000, 500) ; "nothing spent")]
    #[test_case(1900, PollConfig::from_millis(100, 100) ; "interval capped")]
    #[test_case(2000, PollConfig::from_millis(1, 1) ; "budget exhausted")]
    #[test_case(5000, PollConfig::from_millis(1, 1) ; "overspent")]
    fn test_remaining_after(spent_ms: u64, expected: PollConfig) {
        let remaining = PollConfig::from_millis(2000, 500).remaining_after(Duration::from_millis(spent_ms));
        assert_eq!(remaining, expected);
        assert!(remaining.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_budget_keeps_total_deadline() {
        let config = PollConfig::from_millis(2000, 500);
        let start = Instant::now();
        sleep(Duration::from_millis(1900)).await;
        let spent = start.elapsed();

        let outcome = Poller::new(config.remaining_after(spent))
            .wait_until(sequence(&["a"]), length_equals(4))
            .await
            .delayed_by(spent);

        assert!(outcome.is_timed_out());
        assert_eq!(outcome.samples(), 2);
        assert_eq!(outcome.elapsed(), Duration::from_millis(2000));
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: PollConfig = serde_json::from_str(r#"{"timeout_ms": 3000}"#).unwrap();
        assert_eq!(config, PollConfig::from_millis(3000, DEFAULT_INTERVAL_MS));
    }
}
