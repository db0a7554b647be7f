//! # qgov-cli: Command-Line Interface for qgov
//!
//! Provides the `qgov` binary. Everything runs in-process against an
//! in-memory capped ledger; nothing is persisted between invocations.
//!
//! ## Subcommands
//!
//! - `qgov genesis`: Validate a genesis file and summarize it.
//! - `qgov roles`: List the role rosters a genesis file installs.
//! - `qgov run`: Replay a call script against a fresh deployment on a
//!   manual clock and print each outcome.
//!
//! ```bash
//! qgov genesis demos/genesis.yaml
//! qgov roles demos/genesis.yaml --role issuer_admin
//! qgov run demos/genesis.yaml demos/script.yaml --snapshot
//! ```

pub mod genesis;
pub mod roles;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};

use qgov_core::Clock;
use qgov_governance::{CappedLedger, GenesisConfig, GovernanceService};

/// Load and validate a genesis file.
pub fn load_genesis(path: &Path) -> Result<GenesisConfig> {
    GenesisConfig::load(path).with_context(|| format!("loading genesis {}", path.display()))
}

/// Build a service on an empty capped ledger sized by the genesis cap.
pub fn build_service<C: Clock>(
    config: &GenesisConfig,
    clock: C,
) -> Result<GovernanceService<CappedLedger, C>> {
    GovernanceService::from_genesis(config, config.capped_ledger(), clock)
        .context("applying genesis")
}
