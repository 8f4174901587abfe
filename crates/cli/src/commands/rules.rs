//! Rule registry listing

use pwcheck_common::registry;
use serde::Serialize;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Debug, Serialize)]
struct RuleRow {
    name: String,
    pattern: String,
}

impl TableDisplay for RuleRow {
    fn headers() -> Vec<&'static str> {
        vec!["Rule", "Pattern"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.pattern.clone()]
    }
}

pub fn execute(format: OutputFormat) -> anyhow::Result<()> {
    let registry = registry();
    let rows: Vec<RuleRow> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            registry.get(name).map(|regex| RuleRow {
                name: name.to_string(),
                pattern: regex.as_str().to_string(),
            })
        })
        .collect();

    print_list(&rows, format)
}
