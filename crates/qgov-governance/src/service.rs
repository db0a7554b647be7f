//! # Governance Service
//!
//! The thread-safe entry point. Holds both governors and the issuance
//! facade behind `parking_lot` locks and reads the clock once per call, so
//! every check inside an operation sees the same instant.
//!
//! ## Locking
//!
//! Each operation takes the locks it needs for its whole duration, always
//! in the order identity → mint → issuance. A mint therefore sees one
//! consistent view of the caller's role, every recipient's verification
//! and TMAX, and no vote can interleave with it. Independent identity
//! targets still share the identity lock; that is coarser than needed but
//! never wrong.

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use qgov_core::{Clock, Principal, ProposalId, Timestamp};

use crate::call::{Call, CallOutcome};
use crate::config::{ConfigError, GenesisConfig};
use crate::error::Result;
use crate::identity::{ExpirySpec, IdentityGovernor, IdentityPolicy, IdentityProposal, IdentityRecord};
use crate::issuance::{IssuanceLedger, MintReceipt};
use crate::ledger::Ledger;
use crate::mint_rate::{MintPhase, MintProposal, MintRateGovernor};
use crate::roles::Role;
use crate::voting::VoteReceipt;
use crate::Amount;

/// Identity governance, mint-rate governance and issuance, behind locks.
#[derive(Debug)]
pub struct GovernanceService<L, C> {
    identity: RwLock<IdentityGovernor>,
    mint: RwLock<MintRateGovernor>,
    issuance: Mutex<IssuanceLedger<L>>,
    clock: C,
}

impl<L: Ledger, C: Clock> GovernanceService<L, C> {
    /// Assemble a service from already-built parts.
    pub fn new(identity: IdentityGovernor, mint: MintRateGovernor, ledger: L, clock: C) -> Self {
        Self {
            identity: RwLock::new(identity),
            mint: RwLock::new(mint),
            issuance: Mutex::new(IssuanceLedger::new(ledger)),
            clock,
        }
    }

    /// Build the deployment described by `config` on top of `ledger`.
    ///
    /// Role members and verified users are installed without votes, and
    /// the initial supply is credited to the owner.
    pub fn from_genesis(config: &GenesisConfig, ledger: L, clock: C) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let mut identity = IdentityGovernor::new(IdentityPolicy {
            voting_window_secs: config.identity_voting_window_secs,
        });
        for p in &config.trusted_issuers {
            identity.install_role(Role::TrustedIssuer, *p);
        }
        for p in &config.issuer_admins {
            identity.install_role(Role::IssuerAdmin, *p);
        }
        for user in &config.verified_users {
            identity.install_identity(user.principal, user.expires_at);
        }

        let mut mint = MintRateGovernor::new(config.owner, config.tmax, config.mint_voting_window_secs);
        for p in &config.minting_admins {
            mint.install_minting_admin(*p);
        }

        let mut issuance = IssuanceLedger::new(ledger);
        if config.initial_supply > 0 {
            issuance
                .ledger_mut()
                .credit(config.owner, config.initial_supply)
                .map_err(|e| ConfigError::Invalid(format!("initial supply: {e}")))?;
        }

        tracing::info!(
            owner = %config.owner,
            tmax = config.tmax,
            cap = issuance.ledger().cap(),
            trusted_issuers = config.trusted_issuers.len(),
            issuer_admins = config.issuer_admins.len(),
            minting_admins = config.minting_admins.len(),
            verified_users = config.verified_users.len(),
            "governance genesis applied"
        );

        Ok(Self {
            identity: RwLock::new(identity),
            mint: RwLock::new(mint),
            issuance: Mutex::new(issuance),
            clock,
        })
    }

    /// The clock this service reads.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Role administration ──────────────────────────────────────────

    /// Grant `role` to `principal`. Identity roles require a trusted
    /// issuer; the minting role requires the owner.
    pub fn grant_role(&self, caller: Principal, role: Role, principal: Principal) -> Result<bool> {
        match role {
            Role::MintingAdmin => self.mint.write().add_minting_admin(caller, principal),
            _ => self.identity.write().grant_role(caller, role, principal),
        }
    }

    /// Revoke `role` from `principal`.
    pub fn revoke_role(&self, caller: Principal, role: Role, principal: Principal) -> Result<bool> {
        match role {
            Role::MintingAdmin => self.mint.write().remove_minting_admin(caller, principal),
            _ => self.identity.write().revoke_role(caller, role, principal),
        }
    }

    /// Add an issuer admin.
    pub fn add_issuer_admin(&self, caller: Principal, principal: Principal) -> Result<bool> {
        self.grant_role(caller, Role::IssuerAdmin, principal)
    }

    /// Remove an issuer admin.
    pub fn remove_issuer_admin(&self, caller: Principal, principal: Principal) -> Result<bool> {
        self.revoke_role(caller, Role::IssuerAdmin, principal)
    }

    /// Add a trusted issuer.
    pub fn add_trusted_issuer(&self, caller: Principal, principal: Principal) -> Result<bool> {
        self.grant_role(caller, Role::TrustedIssuer, principal)
    }

    /// Remove a trusted issuer.
    pub fn remove_trusted_issuer(&self, caller: Principal, principal: Principal) -> Result<bool> {
        self.revoke_role(caller, Role::TrustedIssuer, principal)
    }

    /// Add a minting admin.
    pub fn add_minting_admin(&self, caller: Principal, principal: Principal) -> Result<bool> {
        self.grant_role(caller, Role::MintingAdmin, principal)
    }

    /// Remove a minting admin.
    pub fn remove_minting_admin(&self, caller: Principal, principal: Principal) -> Result<bool> {
        self.revoke_role(caller, Role::MintingAdmin, principal)
    }

    /// Whether `principal` holds `role`.
    pub fn has_role(&self, role: Role, principal: &Principal) -> bool {
        match role {
            Role::MintingAdmin => self.mint.read().roles().has(role, principal),
            _ => self.identity.read().roles().has(role, principal),
        }
    }

    /// Number of members of `role`.
    pub fn role_count(&self, role: Role) -> usize {
        match role {
            Role::MintingAdmin => self.mint.read().roles().count(role),
            _ => self.identity.read().roles().count(role),
        }
    }

    /// Members of `role`, in insertion order.
    pub fn list_role(&self, role: Role) -> Vec<Principal> {
        match role {
            Role::MintingAdmin => self.mint.read().roles().list(role).to_vec(),
            _ => self.identity.read().roles().list(role).to_vec(),
        }
    }

    /// The `index`th member of `role`.
    pub fn role_member(&self, role: Role, index: usize) -> Option<Principal> {
        match role {
            Role::MintingAdmin => self.mint.read().roles().member_at(role, index),
            _ => self.identity.read().roles().member_at(role, index),
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Propose verifying `target` until `expires_at`.
    pub fn propose_add_identity(&self, caller: Principal, target: Principal, expires_at: Timestamp) -> Result<ProposalId> {
        let now = self.now();
        self.identity.write().propose_add(caller, target, expires_at, now)
    }

    /// Propose revoking `target`.
    pub fn propose_revoke_identity(&self, caller: Principal, target: Principal) -> Result<ProposalId> {
        let now = self.now();
        self.identity.write().propose_revoke(caller, target, now)
    }

    /// Propose a new expiry for `target`.
    pub fn propose_renew_identity(&self, caller: Principal, target: Principal, expiry: ExpirySpec) -> Result<ProposalId> {
        let now = self.now();
        self.identity.write().propose_renew(caller, target, expiry, now)
    }

    /// Vote on `target`'s pending proposal.
    pub fn cast_identity_vote(&self, caller: Principal, target: Principal, support: bool) -> Result<VoteReceipt> {
        let now = self.now();
        self.identity.write().cast_vote(caller, target, support, now)
    }

    /// Verify `target` without a vote.
    pub fn force_add_identity(&self, caller: Principal, target: Principal, expires_at: Timestamp) -> Result<()> {
        self.identity.write().force_add(caller, target, expires_at)
    }

    /// Revoke `target` without a vote.
    pub fn force_revoke_identity(&self, caller: Principal, target: Principal) -> Result<()> {
        self.identity.write().force_revoke(caller, target)
    }

    /// Whether `target` is verified right now.
    pub fn is_verified(&self, target: &Principal) -> bool {
        let now = self.now();
        self.identity.read().is_verified(target, now)
    }

    /// The raw stored record for `target`, ignoring expiry.
    pub fn identity_record(&self, target: &Principal) -> Option<IdentityRecord> {
        self.identity.read().record(target).copied()
    }

    /// A copy of `target`'s pending proposal.
    pub fn identity_proposal(&self, target: &Principal) -> Option<IdentityProposal> {
        self.identity.read().proposal(target).cloned()
    }

    // ── Mint rate ────────────────────────────────────────────────────

    /// Propose a new TMAX. Counts as the proposer's yes vote.
    pub fn propose_mint_change(&self, caller: Principal, recipient: Principal, amount: Amount) -> Result<VoteReceipt> {
        let now = self.now();
        self.mint.write().propose_change(caller, recipient, amount, now)
    }

    /// Vote on the outstanding TMAX proposal.
    pub fn cast_mint_vote(&self, caller: Principal, support: bool) -> Result<VoteReceipt> {
        let now = self.now();
        self.mint.write().cast_vote(caller, support, now)
    }

    /// Current TMAX.
    pub fn tmax(&self) -> Amount {
        self.mint.read().tmax()
    }

    /// The owner principal.
    pub fn owner(&self) -> Principal {
        self.mint.read().owner()
    }

    /// A copy of the outstanding TMAX proposal.
    pub fn mint_proposal(&self) -> Option<MintProposal> {
        self.mint.read().proposal().cloned()
    }

    /// Phase of the TMAX proposal slot right now.
    pub fn mint_phase(&self) -> MintPhase {
        let now = self.now();
        self.mint.read().phase(now)
    }

    // ── Issuance ─────────────────────────────────────────────────────

    /// Mint `amount` to `recipient`.
    pub fn mint_one(&self, caller: Principal, recipient: Principal, amount: Amount) -> Result<MintReceipt> {
        let now = self.now();
        let identity = self.identity.read();
        let mint = self.mint.read();
        self.issuance
            .lock()
            .mint_one(caller, recipient, amount, &mint, &identity, now)
    }

    /// Mint to every recipient in one all-or-nothing call.
    pub fn mint_batch(&self, caller: Principal, recipients: &[Principal], amounts: &[Amount]) -> Result<MintReceipt> {
        let now = self.now();
        let identity = self.identity.read();
        let mint = self.mint.read();
        self.issuance
            .lock()
            .mint_batch(caller, recipients, amounts, &mint, &identity, now)
    }

    /// Move `amount` from `caller` to a verified recipient.
    pub fn transfer(&self, caller: Principal, to: Principal, amount: Amount) -> Result<()> {
        let now = self.now();
        let identity = self.identity.read();
        self.issuance.lock().transfer(caller, to, amount, &identity, now)
    }

    /// All-time amount minted by `admin`.
    pub fn minted_by(&self, admin: &Principal) -> Amount {
        self.issuance.lock().minted_by(admin)
    }

    /// Ledger balance of `holder`.
    pub fn balance_of(&self, holder: &Principal) -> Amount {
        self.issuance.lock().ledger().balance_of(holder)
    }

    /// Total supply.
    pub fn total_supply(&self) -> Amount {
        self.issuance.lock().ledger().total_supply()
    }

    /// Supply cap.
    pub fn cap(&self) -> Amount {
        self.issuance.lock().ledger().cap()
    }

    /// Run `f` against the ledger under the issuance lock.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&L) -> R) -> R {
        f(self.issuance.lock().ledger())
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Run one [`Call`] on behalf of `caller`.
    pub fn execute(&self, caller: Principal, call: &Call) -> Result<CallOutcome> {
        tracing::debug!(%caller, op = call.name(), "executing call");
        let outcome = match call {
            Call::GrantRole { role, principal } => CallOutcome::RoleChanged {
                changed: self.grant_role(caller, *role, *principal)?,
            },
            Call::RevokeRole { role, principal } => CallOutcome::RoleChanged {
                changed: self.revoke_role(caller, *role, *principal)?,
            },
            Call::ProposeAdd { target, expires_at } => CallOutcome::ProposalOpened {
                proposal: self.propose_add_identity(caller, *target, *expires_at)?,
            },
            Call::ProposeRevoke { target } => CallOutcome::ProposalOpened {
                proposal: self.propose_revoke_identity(caller, *target)?,
            },
            Call::ProposeRenew { target, expiry } => CallOutcome::ProposalOpened {
                proposal: self.propose_renew_identity(caller, *target, *expiry)?,
            },
            Call::CastIdentityVote { target, support } => {
                CallOutcome::Vote(self.cast_identity_vote(caller, *target, *support)?)
            }
            Call::ForceAdd { target, expires_at } => {
                self.force_add_identity(caller, *target, *expires_at)?;
                CallOutcome::Done
            }
            Call::ForceRevoke { target } => {
                self.force_revoke_identity(caller, *target)?;
                CallOutcome::Done
            }
            Call::ProposeMintChange { recipient, amount } => {
                CallOutcome::Vote(self.propose_mint_change(caller, *recipient, *amount)?)
            }
            Call::CastMintVote { support } => CallOutcome::Vote(self.cast_mint_vote(caller, *support)?),
            Call::MintOne { recipient, amount } => {
                CallOutcome::Minted(self.mint_one(caller, *recipient, *amount)?)
            }
            Call::MintBatch { recipients, amounts } => {
                CallOutcome::Minted(self.mint_batch(caller, recipients, amounts)?)
            }
            Call::Transfer { to, amount } => {
                self.transfer(caller, *to, *amount)?;
                CallOutcome::Done
            }
            Call::IsVerified { target } => CallOutcome::Verified {
                verified: self.is_verified(target),
            },
            Call::BalanceOf { holder } => CallOutcome::Balance {
                amount: self.balance_of(holder),
            },
            Call::ListRole { role } => CallOutcome::Members {
                members: self.list_role(*role),
            },
        };
        Ok(outcome)
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// A consistent, serializable view of the whole service at the current
    /// instant.
    pub fn snapshot(&self) -> ServiceSnapshot {
        let now = self.now();
        let identity = self.identity.read();
        let mint = self.mint.read();
        let issuance = self.issuance.lock();

        let roles = Role::ALL
            .iter()
            .map(|role| {
                let members = match role {
                    Role::MintingAdmin => mint.roles().list(*role),
                    _ => identity.roles().list(*role),
                };
                (*role, members.to_vec())
            })
            .collect();
        let identities = identity
            .records()
            .map(|(p, r)| {
                (
                    *p,
                    IdentityView {
                        verified: r.is_verified_at(now),
                        expires_at: r.expires_at,
                    },
                )
            })
            .collect();

        ServiceSnapshot {
            at: now,
            owner: mint.owner(),
            tmax: mint.tmax(),
            mint_phase: mint.phase(now),
            mint_proposal: mint.proposal().cloned(),
            total_supply: issuance.ledger().total_supply(),
            cap: issuance.ledger().cap(),
            roles,
            identities,
            identity_proposals: identity.proposals().cloned().collect(),
            minted_by_admin: issuance.minted_totals().clone(),
        }
    }
}

/// An identity as seen at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityView {
    /// Verified at snapshot time, expiry applied.
    pub verified: bool,
    /// Stored expiry.
    pub expires_at: Timestamp,
}

/// Point-in-time view of a [`GovernanceService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    /// When the snapshot was taken.
    pub at: Timestamp,
    /// The owner principal.
    pub owner: Principal,
    /// Current TMAX.
    pub tmax: Amount,
    /// TMAX proposal slot phase.
    pub mint_phase: MintPhase,
    /// Outstanding TMAX proposal.
    pub mint_proposal: Option<MintProposal>,
    /// Total supply.
    pub total_supply: Amount,
    /// Supply cap.
    pub cap: Amount,
    /// Every role's members.
    pub roles: BTreeMap<Role, Vec<Principal>>,
    /// Every stored identity record.
    pub identities: BTreeMap<Principal, IdentityView>,
    /// Pending identity proposals.
    pub identity_proposals: Vec<IdentityProposal>,
    /// All-time minted totals per admin.
    pub minted_by_admin: BTreeMap<Principal, Amount>,
}
