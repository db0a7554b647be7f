//! # qgov-governance: Quorum-Governed Issuance
//!
//! Two independent governed state machines sharing one voting engine, plus
//! a rate-limited issuance facade in front of a capped ledger.
//!
//! ## Components
//!
//! - **Roles** (`roles.rs`): named role memberships (issuer admin, trusted
//!   issuer, minting admin) and the authority that administers each.
//!
//! - **Voting** (`voting.rs`): one-vote-per-voter tallies, deadlines, and
//!   the strict-majority rule `yes * 2 > population`.
//!
//! - **Identity** (`identity.rs`): per-target proposals to add, revoke or
//!   renew a verified identity, with a trusted-issuer bypass. Verification
//!   expires lazily.
//!
//! - **Mint rate** (`mint_rate.rs`): the issuance ceiling TMAX and the
//!   singleton proposal that changes it, under a 24h default window.
//!
//! - **Issuance** (`issuance.rs`): mints only to verified recipients, only
//!   up to TMAX per call, and keeps all-time per-admin totals.
//!
//! - **Ledger** (`ledger.rs`): the balance-keeping capability and an
//!   in-memory capped implementation.
//!
//! - **Service** (`service.rs`): all of the above behind locks with an
//!   injected clock, bootstrapped from a [`GenesisConfig`] (`config.rs`),
//!   and driven by typed [`Call`]s (`call.rs`).
//!
//! ## Failure model
//!
//! Every operation validates before it mutates. A returned error means the
//! call changed nothing.

pub mod call;
pub mod config;
pub mod error;
pub mod identity;
pub mod issuance;
pub mod ledger;
pub mod mint_rate;
pub mod roles;
pub mod service;
pub mod voting;

/// Token quantity. Ledger amounts, TMAX and mint counters all use it.
pub type Amount = u64;

// ─── Re-exports ─────────────────────────────────────────────────────

pub use call::{Call, CallOutcome};
pub use config::{ConfigError, GenesisConfig, GenesisIdentity};
pub use error::{GovernanceError, Result};
pub use identity::{
    ExpirySpec, IdentityAction, IdentityGovernor, IdentityPolicy, IdentityProposal,
    IdentityRecord,
};
pub use issuance::{IssuanceLedger, MintReceipt};
pub use ledger::{CappedLedger, Ledger, LedgerError};
pub use mint_rate::{MintPhase, MintProposal, MintRateGovernor, DEFAULT_MINT_VOTING_WINDOW_SECS};
pub use roles::{Authority, Role, RoleRegistry};
pub use service::{GovernanceService, IdentityView, ServiceSnapshot};
pub use voting::{VoteOutcome, VoteReceipt, VoteStatus, VoteTally};
