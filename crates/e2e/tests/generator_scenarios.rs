//! Generator scenarios against the in-memory generator page
//!
//! Time is paused: render delays, regeneration latency and poll intervals all
//! advance on tokio's mock clock.

use std::path::PathBuf;
use std::time::Duration;

use pwcheck_common::{registry, PollConfig, RuleSet};
use pwcheck_e2e::{
    CharacterClass, CharacterMode, E2eError, GeneratorPage, GeneratorScenario, StubConfig,
    StubGeneratorPage, SuiteConfig, UiDriver,
};

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

#[tokio::test(start_paused = true)]
async fn shipped_scenarios_pass_against_stub() {
    let config = SuiteConfig::default();
    let scenarios = GeneratorScenario::load_all(&scenarios_dir()).unwrap();
    assert_eq!(scenarios.len(), 15);

    for scenario in &scenarios {
        scenario
            .check_rules(registry(), config.max_password_length)
            .unwrap();

        let driver = StubGeneratorPage::default();
        let mut page = GeneratorPage::new(&driver, &config);
        let result = scenario.execute(&mut page).await;

        assert!(result.success, "{}: {:?}", result.name, result.error);
        let password = result.password.unwrap();
        assert_eq!(password.chars().count(), scenario.length, "{}", scenario.name);
        assert_eq!(result.outcome.unwrap().len(), scenario.rules.len());
    }
}

#[test]
fn refresh_tag_selects_refresh_scenarios() {
    let scenarios = GeneratorScenario::load_all(&scenarios_dir()).unwrap();
    let refresh = GeneratorScenario::filter_by_tag(&scenarios, "refresh");
    assert_eq!(refresh.len(), 3);
    assert!(refresh.iter().all(|s| s.refresh));
}

#[tokio::test(start_paused = true)]
async fn mismatching_rules_are_reported_not_raised() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);

    let scenario = GeneratorScenario::from_yaml(
        r#"
name: easy-to-say-with-symbols
length: 10
mode: easy_to_say
rules:
  UPPERCASE: true
  SYMBOLS: true
"#,
    )
    .unwrap();

    let result = scenario.execute(&mut page).await;
    assert!(!result.success);
    let outcome = result.outcome.unwrap();
    assert_eq!(outcome.len(), 2);
    let failed: Vec<&str> = outcome.failures().map(|c| c.rule.as_str()).collect();
    assert_eq!(failed, vec!["SYMBOLS"]);
    assert!(result.error.unwrap().contains("SYMBOLS"));
}

#[tokio::test(start_paused = true)]
async fn open_waits_for_default_length() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);

    let password = page.open().await.unwrap();
    assert_eq!(password.len(), 12);
    assert_eq!(page.mode(), CharacterMode::AllCharacters);
}

#[tokio::test(start_paused = true)]
async fn typed_length_above_max_is_clamped() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);
    page.open().await.unwrap();

    let (length, password) = page.enter_length("51").await.unwrap();
    assert_eq!(length, 50);
    assert_eq!(password.len(), 50);
    assert_eq!(page.length(), 50);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_lengths_are_rejected() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);
    page.open().await.unwrap();
    let generations = driver.generations();

    for length in [0, 51] {
        assert!(matches!(
            page.set_length(length).await,
            Err(E2eError::InvalidLength { max: 50, .. })
        ));
    }
    assert_eq!(driver.generations(), generations);
}

#[tokio::test(start_paused = true)]
async fn slow_generation_times_out_with_last_value() {
    let mut config = SuiteConfig::default();
    config.timers.generate = PollConfig::from_millis(2_000, 500);
    let driver = StubGeneratorPage::new(StubConfig {
        latency: Duration::from_millis(800),
        ..Default::default()
    });
    let mut page = GeneratorPage::new(&driver, &config);
    page.open().await.unwrap();

    let slow = StubGeneratorPage::new(StubConfig {
        latency: Duration::from_secs(30),
        ..Default::default()
    });
    let mut slow_page = GeneratorPage::new(&slow, &config);
    match slow_page.open().await {
        Err(E2eError::GenerationTimeout {
            length: 12,
            timeout_ms: 2_000,
            last,
        }) => assert_eq!(last.as_deref(), Some("")),
        other => panic!("expected generation timeout, got {:?}", other),
    }

    // The fast page regenerates within the window
    assert_eq!(page.set_length(20).await.unwrap().len(), 20);
}

#[tokio::test(start_paused = true)]
async fn slow_render_counts_against_generation_deadline() {
    let mut config = SuiteConfig::default();
    config.timers.generate = PollConfig::from_millis(2_000, 500);
    let driver = StubGeneratorPage::new(StubConfig {
        render_delay: Duration::from_millis(1_900),
        latency: Duration::from_millis(1_500),
        ..Default::default()
    });
    let page = GeneratorPage::new(&driver, &config);

    let start = tokio::time::Instant::now();
    driver.navigate(&config.generator_url).await.unwrap();
    let outcome = page.wait_for_password(12).await;

    assert!(outcome.is_timed_out());
    assert_eq!(outcome.last_value().map(String::as_str), Some(""));
    assert_eq!(outcome.elapsed(), Duration::from_millis(2_000));
    assert!(start.elapsed() <= Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn render_and_generation_share_one_deadline() {
    let mut config = SuiteConfig::default();
    config.timers.generate = PollConfig::from_millis(2_000, 500);
    let driver = StubGeneratorPage::new(StubConfig {
        render_delay: Duration::from_millis(1_000),
        latency: Duration::from_millis(500),
        ..Default::default()
    });
    let page = GeneratorPage::new(&driver, &config);

    driver.navigate(&config.generator_url).await.unwrap();
    let outcome = page.wait_for_password(12).await;

    assert!(outcome.is_satisfied());
    assert!(outcome.elapsed() <= Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn unloaded_page_times_out_without_sampling() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let page = GeneratorPage::new(&driver, &config);

    let outcome = page.wait_for_password(12).await;
    assert!(outcome.is_timed_out());
    assert_eq!(outcome.samples(), 0);
}

#[tokio::test(start_paused = true)]
async fn reselecting_mode_does_not_regenerate() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);
    let initial = page.open().await.unwrap();
    let generations = driver.generations();

    let password = page.select_mode(CharacterMode::AllCharacters).await.unwrap();
    assert_eq!(password, initial);
    assert_eq!(driver.generations(), generations);
}

#[tokio::test(start_paused = true)]
async fn easy_to_say_greys_out_numbers_and_symbols() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);
    let initial = page.open().await.unwrap();

    let password = page.select_mode(CharacterMode::EasyToSay).await.unwrap();
    assert_ne!(password, initial);

    let numbers = page.class_state(CharacterClass::Numbers).await.unwrap();
    assert!(!numbers.checked && !numbers.enabled);
    let upper = page.class_state(CharacterClass::Uppercase).await.unwrap();
    assert!(upper.checked && upper.enabled);

    // Already unchecked: nothing to do, no regeneration
    let generations = driver.generations();
    assert_eq!(page.set_class(CharacterClass::Numbers, false).await.unwrap(), password);
    assert_eq!(driver.generations(), generations);
}

#[tokio::test(start_paused = true)]
async fn unchecking_the_last_class_fails() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);
    page.open().await.unwrap();
    page.select_mode(CharacterMode::EasyToSay).await.unwrap();

    page.set_class(CharacterClass::Lowercase, false).await.unwrap();
    assert!(matches!(
        page.set_class(CharacterClass::Uppercase, false).await,
        Err(E2eError::Driver(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn refresh_keeps_adjusted_rules() {
    let config = SuiteConfig::default();
    let driver = StubGeneratorPage::default();
    let mut page = GeneratorPage::new(&driver, &config);
    page.open().await.unwrap();
    page.set_length(46).await.unwrap();
    page.select_mode(CharacterMode::EasyToRead).await.unwrap();
    let before = page.set_class(CharacterClass::Numbers, false).await.unwrap();

    let after = page.refresh().await.unwrap();
    assert_ne!(after, before);
    assert_eq!(after, driver.read_value(pwcheck_e2e::locators::generator::PASSWORD_INPUT).await.unwrap());

    let rules = RuleSet::new()
        .require("UPPERCASE")
        .require("LOWERCASE")
        .forbid("NUMBERS")
        .require("SYMBOLS")
        .forbid("AMBIGUOUS_I_1_O_0");
    assert!(pwcheck_e2e::ensure_rules(&after, &rules).is_ok());
}
