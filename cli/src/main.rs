use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rcm_core::config::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

/// Evidence-grounded assessment of Risk Control Matrix rows.
#[derive(Debug, Parser)]
#[command(name = "rcm-audit", version, about)]
struct Cli {
    /// YAML configuration file. Relative paths inside it resolve against its directory.
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build (or reload) the client and regulations indexes and print their status.
    Index,
    /// Audit every input row and write the JSON results.
    Run,
    /// Write an executive summary of the client corpus, unless one exists.
    Summary,
    /// Score audit answers against expert answers and write the CSV report.
    Compare,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = AppConfig::load_from(&cli.config).and_then(|cfg| match cli.command {
        Command::Index => commands::index(&cfg),
        Command::Run => commands::run(&cfg),
        Command::Summary => commands::summary(&cfg),
        Command::Compare => commands::compare(&cfg),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = %e.code, err = %e.describe(), "command failed");
            ExitCode::FAILURE
        }
    }
}
