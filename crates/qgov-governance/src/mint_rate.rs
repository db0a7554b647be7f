//! # Mint-Rate Governor
//!
//! Owns the issuance ceiling (TMAX) and the single outstanding proposal to
//! change it.
//!
//! ## States
//!
//! ```text
//! Idle ──propose──▶ Proposed ──majority──▶ Applied (TMAX changed, back to Idle)
//!                      │  ▲
//!                      │  └──propose──  (Overwritten)
//!                      └──deadline passes──▶ Expired (inert until overwritten)
//! ```
//!
//! Proposing counts as a yes vote from the proposer. Majority is then
//! measured against the minting-admin roster at each vote, including the
//! proposer's implicit vote.
//!
//! Deviation: proposing is not a pure "open a proposal" step. The implicit
//! yes is evaluated like any other registered vote, so a proposal that
//! already holds a majority applies immediately. With a sole minting admin
//! `propose_change` itself changes TMAX and leaves no proposal behind,
//! where a strict reading has TMAX change only through `cast_vote`.
//!
//! The minting-admin role is administered by a single owner principal that
//! need not be a minting admin itself.

use serde::{Deserialize, Serialize};

use qgov_core::{Principal, ProposalId, Timestamp};

use crate::error::{GovernanceError, Result};
use crate::roles::{Authority, Role, RoleRegistry};
use crate::voting::{self, VoteReceipt, VoteStatus, VoteTally};
use crate::Amount;

/// Default mint-rate voting window: 24 hours.
pub const DEFAULT_MINT_VOTING_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Subject label used for the singleton proposal in errors and metrics.
const SUBJECT: &str = "mint-rate";

/// A pending change to TMAX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintProposal {
    /// Identifies this proposal instance.
    pub id: ProposalId,
    /// Minting admin who proposed it.
    pub proposer: Principal,
    /// Beneficiary carried alongside the proposal. Informational only; it
    /// plays no part in the ceiling arithmetic.
    pub recipient: Principal,
    /// Proposed new TMAX.
    pub amount: Amount,
    /// When it was proposed.
    pub created_at: Timestamp,
    /// Votes so far, including the proposer's.
    pub tally: VoteTally,
}

/// Where the singleton proposal slot stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MintPhase {
    /// No proposal.
    Idle,
    /// A proposal is open for votes.
    Proposed,
    /// A proposal sits past its deadline.
    Expired,
}

impl std::fmt::Display for MintPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Proposed => "PROPOSED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// TMAX, its change proposal, and the minting-admin roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRateGovernor {
    owner: Principal,
    roles: RoleRegistry,
    tmax: Amount,
    proposal: Option<MintProposal>,
    voting_window_secs: u64,
}

impl MintRateGovernor {
    /// A governor with no minting admins and the given ceiling.
    pub fn new(owner: Principal, tmax: Amount, voting_window_secs: u64) -> Self {
        Self {
            owner,
            roles: RoleRegistry::new(),
            tmax,
            proposal: None,
            voting_window_secs,
        }
    }

    /// Install a minting admin without an authorization check (genesis only).
    pub(crate) fn install_minting_admin(&mut self, principal: Principal) {
        self.roles.grant(Role::MintingAdmin, principal);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current issuance ceiling.
    pub fn tmax(&self) -> Amount {
        self.tmax
    }

    /// The owner principal.
    pub fn owner(&self) -> Principal {
        self.owner
    }

    /// The outstanding proposal, live or expired.
    pub fn proposal(&self) -> Option<&MintProposal> {
        self.proposal.as_ref()
    }

    /// Phase of the proposal slot at `now`.
    pub fn phase(&self, now: Timestamp) -> MintPhase {
        match &self.proposal {
            None => MintPhase::Idle,
            Some(p) if p.tally.is_expired(now) => MintPhase::Expired,
            Some(_) => MintPhase::Proposed,
        }
    }

    /// Whether `principal` is a minting admin.
    pub fn is_minting_admin(&self, principal: &Principal) -> bool {
        self.roles.has(Role::MintingAdmin, principal)
    }

    /// Minting-admin roster.
    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    /// Voting window for new proposals, in seconds.
    pub fn voting_window_secs(&self) -> u64 {
        self.voting_window_secs
    }

    /// Fail with `Unauthorized` unless `caller` is a minting admin.
    pub fn require_minting_admin(&self, caller: Principal) -> Result<()> {
        if self.is_minting_admin(&caller) {
            return Ok(());
        }
        metrics::counter!("qgov_rejections_total", "kind" => "unauthorized").increment(1);
        tracing::warn!(%caller, "mint call rejected: missing minting_admin role");
        Err(GovernanceError::Unauthorized {
            caller,
            required: Authority::Role(Role::MintingAdmin),
        })
    }

    // ── Proposal lifecycle ───────────────────────────────────────────

    /// Propose setting TMAX to `amount`, replacing any outstanding proposal.
    ///
    /// The proposer's yes vote is recorded immediately and evaluated, so
    /// the returned receipt may already report the change as passed.
    pub fn propose_change(
        &mut self,
        caller: Principal,
        recipient: Principal,
        amount: Amount,
        now: Timestamp,
    ) -> Result<VoteReceipt> {
        self.require_minting_admin(caller)?;

        let population = self.roles.count(Role::MintingAdmin);
        let deadline = voting::deadline_after(now, Some(self.voting_window_secs));
        let proposal = MintProposal {
            id: ProposalId::new(),
            proposer: caller,
            recipient,
            amount,
            created_at: now,
            tally: VoteTally::open_with_yes(caller, deadline),
        };
        let receipt = VoteReceipt::evaluate(proposal.id, &proposal.tally, population);
        if let Some(previous) = self.proposal.replace(proposal) {
            tracing::debug!(replaced = %previous.id, "mint-rate proposal overwritten");
        }
        metrics::counter!("qgov_votes_total", "subject" => SUBJECT).increment(1);

        tracing::debug!(
            proposal = %receipt.proposal,
            proposer = %caller,
            %recipient,
            amount,
            "mint-rate proposal opened"
        );
        if receipt.passed() {
            self.apply(now);
        }
        Ok(receipt)
    }

    /// Vote on the outstanding proposal.
    ///
    /// On reaching majority, TMAX takes the proposed value and the slot is
    /// cleared in the same call.
    pub fn cast_vote(&mut self, caller: Principal, support: bool, now: Timestamp) -> Result<VoteReceipt> {
        self.require_minting_admin(caller)?;
        let population = self.roles.count(Role::MintingAdmin);

        let proposal = self
            .proposal
            .as_mut()
            .ok_or_else(|| GovernanceError::NoActiveProposal {
                subject: SUBJECT.to_string(),
            })?;

        match voting::register_vote(&mut proposal.tally, caller, support, now) {
            VoteStatus::Accepted => {}
            VoteStatus::AlreadyVoted => {
                return Err(GovernanceError::AlreadyVoted {
                    voter: caller,
                    proposal: proposal.id,
                })
            }
            VoteStatus::Expired => {
                return Err(GovernanceError::Expired {
                    proposal: proposal.id,
                    deadline: proposal.tally.deadline().unwrap_or(now),
                })
            }
        }
        let receipt = VoteReceipt::evaluate(proposal.id, &proposal.tally, population);
        metrics::counter!("qgov_votes_total", "subject" => SUBJECT).increment(1);
        tracing::debug!(
            proposal = %receipt.proposal,
            voter = %caller,
            support,
            yes = receipt.yes_count,
            population = receipt.population,
            "mint-rate vote recorded"
        );
        if receipt.passed() {
            self.apply(now);
        }
        Ok(receipt)
    }

    fn apply(&mut self, now: Timestamp) {
        if let Some(passed) = self.proposal.take() {
            let previous = self.tmax;
            self.tmax = passed.amount;
            metrics::counter!("qgov_proposals_applied_total", "subject" => SUBJECT).increment(1);
            tracing::info!(
                proposal = %passed.id,
                previous,
                tmax = self.tmax,
                recipient = %passed.recipient,
                at = %now,
                "TMAX changed by vote"
            );
        }
    }

    // ── Role administration ──────────────────────────────────────────

    /// Add a minting admin. Owner only.
    pub fn add_minting_admin(&mut self, caller: Principal, principal: Principal) -> Result<bool> {
        self.require_owner(caller)?;
        let added = self.roles.grant(Role::MintingAdmin, principal);
        tracing::info!(%principal, added, "minting admin granted");
        Ok(added)
    }

    /// Remove a minting admin. Owner only.
    pub fn remove_minting_admin(&mut self, caller: Principal, principal: Principal) -> Result<bool> {
        self.require_owner(caller)?;
        let removed = self.roles.revoke(Role::MintingAdmin, &principal);
        tracing::info!(%principal, removed, "minting admin revoked");
        Ok(removed)
    }

    fn require_owner(&self, caller: Principal) -> Result<()> {
        if caller == self.owner {
            return Ok(());
        }
        metrics::counter!("qgov_rejections_total", "kind" => "unauthorized").increment(1);
        tracing::warn!(%caller, "minting role change rejected: caller is not the owner");
        Err(GovernanceError::Unauthorized {
            caller,
            required: Authority::Owner,
        })
    }
}
