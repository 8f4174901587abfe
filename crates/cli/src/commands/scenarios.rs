//! Generator scenario listing, linting and stub runs

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use pwcheck_common::registry;
use pwcheck_e2e::{GeneratorPage, GeneratorScenario, ScenarioResult, StubConfig, StubGeneratorPage, SuiteConfig};
use serde::Serialize;
use tracing::info;

use crate::output::{print_list, print_warning, status, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ScenariosArgs {
    /// Directory searched recursively for `.yaml`/`.yml` scenarios
    #[arg(short, long, default_value = "crates/e2e/scenarios")]
    pub dir: PathBuf,

    /// Keep only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run every valid scenario against the in-memory generator page
    #[arg(long)]
    pub run: bool,

    /// Regeneration latency of the in-memory page
    #[arg(long, default_value = "200")]
    pub stub_latency_ms: u64,
}

#[derive(Debug, Serialize)]
struct ScenarioRow {
    name: String,
    length: usize,
    mode: String,
    tags: String,
    rules: usize,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ScenarioResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ScenarioRow {
    fn passed(&self) -> bool {
        self.valid && self.result.as_ref().map_or(true, |r| r.success)
    }
}

impl TableDisplay for ScenarioRow {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Length", "Mode", "Tags", "Rules", "Status", "Details"]
    }

    fn row(&self) -> Vec<String> {
        let details = match (&self.error, &self.result) {
            (Some(e), _) => e.clone(),
            (None, Some(r)) => r
                .error
                .clone()
                .or_else(|| r.password.clone())
                .unwrap_or_default(),
            (None, None) => String::new(),
        };
        vec![
            self.name.clone(),
            self.length.to_string(),
            self.mode.clone(),
            self.tags.clone(),
            self.rules.to_string(),
            status(self.passed()),
            details,
        ]
    }
}

/// Returns the process exit status
pub async fn execute(args: ScenariosArgs, config: &SuiteConfig, format: OutputFormat) -> anyhow::Result<i32> {
    let all = GeneratorScenario::load_all(&args.dir)
        .with_context(|| format!("Failed to load scenarios from {}", args.dir.display()))?;
    let selected: Vec<&GeneratorScenario> = match &args.tag {
        Some(tag) => GeneratorScenario::filter_by_tag(&all, tag),
        None => all.iter().collect(),
    };
    info!("Loaded {} scenario(s) from {}", selected.len(), args.dir.display());

    if selected.is_empty() {
        print_warning(&format!("No scenarios found in {}", args.dir.display()));
        return Ok(0);
    }

    let stub = StubConfig {
        latency: Duration::from_millis(args.stub_latency_ms),
        max_length: config.max_password_length,
        default_length: config.default_password_length,
        ..Default::default()
    };

    let mut rows = Vec::with_capacity(selected.len());
    for scenario in selected {
        let lint = scenario.check_rules(registry(), config.max_password_length);
        let mut row = ScenarioRow {
            name: scenario.name.clone(),
            length: scenario.length,
            mode: scenario.mode.to_string(),
            tags: scenario.tags.join(", "),
            rules: scenario.rules.len(),
            valid: lint.is_ok(),
            result: None,
            error: lint.err().map(|e| e.to_string()),
        };

        if args.run && row.valid {
            let driver = StubGeneratorPage::new(stub.clone());
            let mut page = GeneratorPage::new(&driver, config);
            row.result = Some(scenario.execute(&mut page).await);
        }
        rows.push(row);
    }

    print_list(&rows, format)?;

    let failed = rows.iter().filter(|r| !r.passed()).count();
    Ok(if failed == 0 { 0 } else { 1 })
}
