//! # qgov CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qgov_cli::genesis::{run_genesis, GenesisArgs};
use qgov_cli::roles::{run_roles, RolesArgs};
use qgov_cli::run::{run_script, RunArgs};

/// qgov: quorum-governed identity and issuance.
///
/// Validates deployments and replays governance call scripts against an
/// in-memory ledger.
#[derive(Parser, Debug)]
#[command(name = "qgov", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a genesis file and summarize it.
    Genesis(GenesisArgs),

    /// List role rosters installed by a genesis file.
    Roles(RolesArgs),

    /// Replay a call script against a fresh deployment.
    Run(RunArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "qgov CLI starting");

    let result = match cli.command {
        Commands::Genesis(args) => run_genesis(&args),
        Commands::Roles(args) => run_roles(&args),
        Commands::Run(args) => run_script(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
