//! # Calls
//!
//! Every state-changing operation, and the queries worth scripting, as a
//! serializable value. [`GovernanceService::execute`] dispatches these, so
//! a recorded sequence of `(caller, Call)` pairs can be replayed against a
//! fresh service.
//!
//! On the wire a call is a tagged map:
//!
//! ```yaml
//! op: propose_add
//! target: "0x0000000000000000000000000000000000000010"
//! expires_at: "2027-01-01T00:00:00Z"
//! ```
//!
//! [`GovernanceService::execute`]: crate::service::GovernanceService::execute

use serde::{Deserialize, Serialize};

use qgov_core::{Principal, ProposalId, Timestamp};

use crate::identity::ExpirySpec;
use crate::issuance::MintReceipt;
use crate::roles::Role;
use crate::voting::VoteReceipt;
use crate::Amount;

/// A single operation, without its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    // ── Roles ────────────────────────────────────────────────────────
    /// Add `principal` to `role`.
    GrantRole { role: Role, principal: Principal },
    /// Remove `principal` from `role`.
    RevokeRole { role: Role, principal: Principal },

    // ── Identity ─────────────────────────────────────────────────────
    /// Propose verifying `target`.
    ProposeAdd { target: Principal, expires_at: Timestamp },
    /// Propose revoking `target`.
    ProposeRevoke { target: Principal },
    /// Propose a new expiry for `target`.
    ProposeRenew { target: Principal, expiry: ExpirySpec },
    /// Vote on `target`'s pending proposal.
    CastIdentityVote { target: Principal, support: bool },
    /// Verify `target` without a vote.
    ForceAdd { target: Principal, expires_at: Timestamp },
    /// Revoke `target` without a vote.
    ForceRevoke { target: Principal },

    // ── Mint rate ────────────────────────────────────────────────────
    /// Propose a new TMAX.
    ProposeMintChange { recipient: Principal, amount: Amount },
    /// Vote on the outstanding TMAX proposal.
    CastMintVote { support: bool },

    // ── Issuance ─────────────────────────────────────────────────────
    /// Mint to one recipient.
    MintOne { recipient: Principal, amount: Amount },
    /// Mint to many recipients at once.
    MintBatch {
        recipients: Vec<Principal>,
        amounts: Vec<Amount>,
    },
    /// Move the caller's balance to a verified recipient.
    Transfer { to: Principal, amount: Amount },

    // ── Queries ──────────────────────────────────────────────────────
    /// Whether `target` is verified now.
    IsVerified { target: Principal },
    /// Balance of `holder`.
    BalanceOf { holder: Principal },
    /// Members of `role`, in insertion order.
    ListRole { role: Role },
}

impl Call {
    /// The `op` tag, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GrantRole { .. } => "grant_role",
            Self::RevokeRole { .. } => "revoke_role",
            Self::ProposeAdd { .. } => "propose_add",
            Self::ProposeRevoke { .. } => "propose_revoke",
            Self::ProposeRenew { .. } => "propose_renew",
            Self::CastIdentityVote { .. } => "cast_identity_vote",
            Self::ForceAdd { .. } => "force_add",
            Self::ForceRevoke { .. } => "force_revoke",
            Self::ProposeMintChange { .. } => "propose_mint_change",
            Self::CastMintVote { .. } => "cast_mint_vote",
            Self::MintOne { .. } => "mint_one",
            Self::MintBatch { .. } => "mint_batch",
            Self::Transfer { .. } => "transfer",
            Self::IsVerified { .. } => "is_verified",
            Self::BalanceOf { .. } => "balance_of",
            Self::ListRole { .. } => "list_role",
        }
    }

    /// Whether the call only reads state.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::IsVerified { .. } | Self::BalanceOf { .. } | Self::ListRole { .. }
        )
    }
}

/// What a successful call returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CallOutcome {
    /// A role grant or revoke; `changed` is false when it was a no-op.
    RoleChanged { changed: bool },
    /// An identity proposal was opened.
    ProposalOpened { proposal: ProposalId },
    /// A vote (or a mint proposal with its implicit vote) was recorded.
    Vote(VoteReceipt),
    /// A forced identity change or a transfer went through.
    Done,
    /// A mint went through.
    Minted(MintReceipt),
    /// Answer to [`Call::IsVerified`].
    Verified { verified: bool },
    /// Answer to [`Call::BalanceOf`].
    Balance { amount: Amount },
    /// Answer to [`Call::ListRole`].
    Members { members: Vec<Principal> },
}
