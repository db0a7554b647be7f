//! # Genesis Subcommand
//!
//! Validates a genesis file and prints what it would deploy.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use qgov_governance::GenesisConfig;

/// Arguments for `qgov genesis`.
#[derive(Args, Debug)]
pub struct GenesisArgs {
    /// Genesis file (YAML, or JSON with a `.json` extension).
    pub path: PathBuf,

    /// Print the parsed configuration as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Execute `qgov genesis`.
pub fn run_genesis(args: &GenesisArgs) -> Result<u8> {
    let config = crate::load_genesis(&args.path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", summarize(&config));
    }
    Ok(0)
}

/// Human-readable summary of a validated configuration.
pub fn summarize(config: &GenesisConfig) -> String {
    let identity_window = match config.identity_voting_window_secs {
        Some(secs) => format!("{secs}s"),
        None => "none".to_string(),
    };
    let mut out = String::new();
    out.push_str("OK: genesis is valid\n");
    out.push_str(&format!("  Owner: {}\n", config.owner));
    out.push_str(&format!("  TMAX: {}\n", config.tmax));
    out.push_str(&format!("  Supply cap: {}\n", config.supply_cap));
    out.push_str(&format!("  Initial supply: {}\n", config.initial_supply));
    out.push_str(&format!(
        "  Mint voting window: {}s\n",
        config.mint_voting_window_secs
    ));
    out.push_str(&format!("  Identity voting window: {identity_window}\n"));
    out.push_str(&format!(
        "  Roles: {} trusted issuer(s), {} issuer admin(s), {} minting admin(s)\n",
        config.trusted_issuers.len(),
        config.issuer_admins.len(),
        config.minting_admins.len()
    ));
    out.push_str(&format!(
        "  Verified users: {}\n",
        config.verified_users.len()
    ));
    out
}
