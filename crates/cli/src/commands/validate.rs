//! Validate a string against named rules

use clap::Args;
use pwcheck_common::{registry, Error, RuleCheck, RuleSet};
use tracing::debug;

use crate::output::{print_error, print_report, print_success, status, OutputFormat, TableDisplay};

/// Exit status when a rule does not hold
pub const EXIT_MISMATCH: i32 = 1;
/// Exit status when a rule name is unknown
pub const EXIT_UNKNOWN_RULE: i32 = 2;

#[derive(Args)]
pub struct ValidateArgs {
    /// String to validate
    pub value: String,

    /// Rule expectation, e.g. `-r UPPERCASE=true -r SYMBOLS=false`
    #[arg(short, long = "rule", required = true, value_parser = RuleSet::parse_entry)]
    pub rules: Vec<(String, bool)>,
}

impl TableDisplay for RuleCheck {
    fn headers() -> Vec<&'static str> {
        vec!["Rule", "Expected", "Found", "Status"]
    }

    fn row(&self) -> Vec<String> {
        let presence = |present: bool| if present { "present" } else { "absent" }.to_string();
        vec![
            self.rule.clone(),
            presence(self.expected_present),
            presence(self.matched),
            status(self.passed),
        ]
    }
}

/// Returns the process exit status
pub fn execute(args: ValidateArgs, format: OutputFormat) -> anyhow::Result<i32> {
    let rules: RuleSet = args.rules.into_iter().collect();
    debug!(rules = rules.len(), "Validating value");

    let outcome = match pwcheck_common::validate(&args.value, &rules, registry()) {
        Ok(outcome) => outcome,
        Err(e @ Error::UnknownRule(_)) => {
            print_error(&format!("{} (known rules: {})", e, registry().names().join(", ")));
            return Ok(EXIT_UNKNOWN_RULE);
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&outcome, &outcome.checks, format)?;

    if outcome.passed() {
        if matches!(format, OutputFormat::Table) {
            print_success(&outcome.to_string());
        }
        Ok(0)
    } else {
        if matches!(format, OutputFormat::Table) {
            print_error(&outcome.to_string());
        }
        Ok(EXIT_MISMATCH)
    }
}
