//! PwCheck CLI - Main Entry Point
//!
//! Offline tooling around the password rules and generator scenarios:
//! list the rule registry, validate a string, lint and dry-run scenarios.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pwcheck_e2e::SuiteConfig;

mod commands;
mod output;

use commands::{rules, scenarios, validate};

/// PwCheck CLI - password rule checks and generator scenarios
#[derive(Parser)]
#[command(name = "pwcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Suite configuration file (defaults apply when missing)
    #[arg(long, default_value = "pwcheck.toml", env = "PWCHECK_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the validation rules and their patterns
    Rules,

    /// Validate a string against rule expectations
    Validate(validate::ValidateArgs),

    /// List, lint and optionally run generator scenarios
    Scenarios(scenarios::ScenariosArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Commands::Rules => {
            rules::execute(cli.format)?;
            0
        }
        Commands::Validate(args) => validate::execute(args, cli.format)?,
        Commands::Scenarios(args) => {
            let config = SuiteConfig::load(&cli.config)?.with_env_overrides()?;
            scenarios::execute(args, &config, cli.format).await?
        }
        Commands::Version => {
            println!("pwcheck {}", env!("CARGO_PKG_VERSION"));
            println!("pwcheck-common {}", pwcheck_common::VERSION);
            0
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
