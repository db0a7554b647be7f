//! # Roles Subcommand
//!
//! Lists the role rosters installed by a genesis file, in roster order.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;

use qgov_governance::{GenesisConfig, Role};
use qgov_core::Principal;

/// Arguments for `qgov roles`.
#[derive(Args, Debug)]
pub struct RolesArgs {
    /// Genesis file.
    pub path: PathBuf,

    /// Only list this role (`issuer_admin`, `trusted_issuer`, `minting_admin`).
    #[arg(long)]
    pub role: Option<String>,
}

/// Execute `qgov roles`.
pub fn run_roles(args: &RolesArgs) -> Result<u8> {
    let config = crate::load_genesis(&args.path)?;
    let roles = match &args.role {
        Some(name) => vec![Role::from_name(name).ok_or_else(|| anyhow!("unknown role: {name}"))?],
        None => Role::ALL.to_vec(),
    };
    for role in roles {
        let members = members(&config, role);
        println!("{role} ({}):", members.len());
        for (i, p) in members.iter().enumerate() {
            println!("  [{i}] {p}");
        }
    }
    Ok(0)
}

/// Genesis members of `role`.
pub fn members(config: &GenesisConfig, role: Role) -> &[Principal] {
    match role {
        Role::IssuerAdmin => &config.issuer_admins,
        Role::TrustedIssuer => &config.trusted_issuers,
        Role::MintingAdmin => &config.minting_admins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_follow_config_lists() {
        let mut config = GenesisConfig::new(Principal::from_bytes([0xaa; 20]), 10, 100);
        config.minting_admins = vec![Principal::from_bytes([4; 20])];
        assert_eq!(members(&config, Role::MintingAdmin).len(), 1);
        assert!(members(&config, Role::IssuerAdmin).is_empty());
    }

    #[test]
    fn unknown_role_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.yaml");
        std::fs::write(
            &path,
            "owner: \"0x00000000000000000000000000000000000000aa\"\ntmax: 5\nsupply_cap: 5\n",
        )
        .unwrap();
        let args = RolesArgs {
            path,
            role: Some("miner".into()),
        };
        assert!(run_roles(&args).is_err());
    }
}
