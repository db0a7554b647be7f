//! # Genesis Configuration
//!
//! The starting state of a deployment: the owner, the issuance ceiling, the
//! supply cap, and every role member and verified user installed before
//! any vote can take place.
//!
//! Loaded from YAML or JSON. The format is chosen by file extension
//! (`.json` is JSON, anything else is YAML).
//!
//! ```yaml
//! owner: "0x00000000000000000000000000000000000000aa"
//! tmax: 10000
//! supply_cap: 1000000000
//! initial_supply: 500000
//! trusted_issuers: ["0x...01"]
//! issuer_admins: ["0x...02", "0x...03"]
//! minting_admins: ["0x...04"]
//! verified_users:
//!   - principal: "0x...10"
//!     expires_at: "2027-01-01T00:00:00Z"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use qgov_core::{Principal, Timestamp};

use crate::ledger::CappedLedger;
use crate::mint_rate::DEFAULT_MINT_VOTING_WINDOW_SECS;
use crate::Amount;

/// A user verified at genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisIdentity {
    /// The verified principal.
    pub principal: Principal,
    /// When verification lapses.
    pub expires_at: Timestamp,
}

/// Deployment-time state of a governance service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisConfig {
    /// Administers the minting-admin role and receives the initial supply.
    pub owner: Principal,
    /// Initial per-call issuance ceiling.
    pub tmax: Amount,
    /// Hard cap on total supply.
    pub supply_cap: Amount,
    /// Amount credited to the owner at genesis.
    #[serde(default)]
    pub initial_supply: Amount,
    /// Voting window for mint-rate proposals.
    #[serde(default = "default_mint_window")]
    pub mint_voting_window_secs: u64,
    /// Voting window for identity proposals. Absent means no deadline.
    #[serde(default)]
    pub identity_voting_window_secs: Option<u64>,
    /// Initial trusted issuers.
    #[serde(default)]
    pub trusted_issuers: Vec<Principal>,
    /// Initial issuer admins.
    #[serde(default)]
    pub issuer_admins: Vec<Principal>,
    /// Initial minting admins.
    #[serde(default)]
    pub minting_admins: Vec<Principal>,
    /// Users verified at genesis.
    #[serde(default)]
    pub verified_users: Vec<GenesisIdentity>,
}

fn default_mint_window() -> u64 {
    DEFAULT_MINT_VOTING_WINDOW_SECS
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The document did not parse.
    #[error("cannot parse genesis config: {0}")]
    Parse(String),
    /// The document parsed but describes an unusable deployment.
    #[error("invalid genesis config: {0}")]
    Invalid(String),
}

impl GenesisConfig {
    /// Minimal configuration with no role members or users.
    pub fn new(owner: Principal, tmax: Amount, supply_cap: Amount) -> Self {
        Self {
            owner,
            tmax,
            supply_cap,
            initial_supply: 0,
            mint_voting_window_secs: DEFAULT_MINT_VOTING_WINDOW_SECS,
            identity_voting_window_secs: None,
            trusted_issuers: Vec::new(),
            issuer_admins: Vec::new(),
            minting_admins: Vec::new(),
            verified_users: Vec::new(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_yaml_str(&raw)
        }
    }

    /// Check the invariants a deployment needs before anything is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tmax == 0 {
            return Err(ConfigError::Invalid("tmax must be positive".into()));
        }
        if self.tmax > self.supply_cap {
            return Err(ConfigError::Invalid(format!(
                "tmax {} exceeds supply cap {}",
                self.tmax, self.supply_cap
            )));
        }
        if self.initial_supply > self.supply_cap {
            return Err(ConfigError::Invalid(format!(
                "initial supply {} exceeds supply cap {}",
                self.initial_supply, self.supply_cap
            )));
        }
        if self.mint_voting_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "mint_voting_window_secs must be positive".into(),
            ));
        }
        if self.identity_voting_window_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "identity_voting_window_secs must be positive when set".into(),
            ));
        }
        Ok(())
    }

    /// An empty in-memory ledger sized to this configuration's cap.
    pub fn capped_ledger(&self) -> CappedLedger {
        CappedLedger::new(self.supply_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GENESIS: &str = r#"
owner: "0x00000000000000000000000000000000000000aa"
tmax: 10000
supply_cap: 1000000
initial_supply: 500
trusted_issuers: ["0x0000000000000000000000000000000000000001"]
issuer_admins:
  - "0x0000000000000000000000000000000000000002"
  - "0x0000000000000000000000000000000000000003"
minting_admins: ["0x0000000000000000000000000000000000000004"]
verified_users:
  - principal: "0x0000000000000000000000000000000000000010"
    expires_at: "2027-01-01T00:00:00Z"
"#;

    #[test]
    fn yaml_genesis_parses_with_defaults() {
        let config = GenesisConfig::from_yaml_str(GENESIS).unwrap();
        assert_eq!(config.tmax, 10_000);
        assert_eq!(config.issuer_admins.len(), 2);
        assert_eq!(config.mint_voting_window_secs, DEFAULT_MINT_VOTING_WINDOW_SECS);
        assert_eq!(config.identity_voting_window_secs, None);
        assert_eq!(
            config.verified_users[0].expires_at,
            Timestamp::parse("2027-01-01T00:00:00Z").unwrap()
        );
    }

    #[test]
    fn json_genesis_parses() {
        let owner = Principal::from_bytes([0xaa; 20]);
        let json = serde_json::to_string(&GenesisConfig::new(owner, 5, 10)).unwrap();
        let config = GenesisConfig::from_json_str(&json).unwrap();
        assert_eq!(config.owner, owner);
        assert!(config.minting_admins.is_empty());
    }

    #[test]
    fn bad_principal_is_a_parse_error() {
        let doc = GENESIS.replace("0x00000000000000000000000000000000000000aa", "0xnope");
        assert!(matches!(
            GenesisConfig::from_yaml_str(&doc),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let doc = format!("{GENESIS}block_reward: 5\n");
        assert!(matches!(
            GenesisConfig::from_yaml_str(&doc),
            Err(ConfigError::Parse(_))
        ));
    }

    // ── validate ─────────────────────────────────────────────────────

    fn base() -> GenesisConfig {
        GenesisConfig::new(Principal::from_bytes([0xaa; 20]), 100, 1_000)
    }

    #[test]
    fn zero_tmax_rejected() {
        let mut config = base();
        config.tmax = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn tmax_above_cap_rejected() {
        let mut config = base();
        config.tmax = 1_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn initial_supply_above_cap_rejected() {
        let mut config = base();
        config.initial_supply = 1_001;
        assert!(config.validate().is_err());
        config.initial_supply = 1_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_windows_rejected() {
        let mut config = base();
        config.mint_voting_window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.identity_voting_window_secs = Some(0);
        assert!(config.validate().is_err());
        config.identity_voting_window_secs = Some(60);
        assert!(config.validate().is_ok());
    }

    // ── files ────────────────────────────────────────────────────────

    #[test]
    fn load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(GENESIS.as_bytes()).unwrap();
        let config = GenesisConfig::load(file.path()).unwrap();
        assert_eq!(config.initial_supply, 500);
    }

    #[test]
    fn load_json_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let json = serde_json::to_string(&base()).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let config = GenesisConfig::load(file.path()).unwrap();
        assert_eq!(config.supply_cap, 1_000);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GenesisConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn capped_ledger_uses_cap() {
        use crate::ledger::Ledger;
        assert_eq!(base().capped_ledger().cap(), 1_000);
    }
}
