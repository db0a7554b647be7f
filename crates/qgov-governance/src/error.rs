//! # Governance Errors
//!
//! Every failure a governance call can produce. All of them are scoped to
//! the single call that raised them: the operation validated, found a
//! problem, and returned before mutating anything.

use thiserror::Error;

use qgov_core::{Principal, ProposalId, Timestamp};

use crate::ledger::LedgerError;
use crate::roles::Authority;
use crate::Amount;

/// Result alias for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Errors returned by governors, the issuance facade and the service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// The caller does not hold the authority the operation requires.
    #[error("{caller} is missing {required}")]
    Unauthorized {
        /// Who attempted the call.
        caller: Principal,
        /// What they needed.
        required: Authority,
    },

    /// The voter already voted on this proposal.
    #[error("{voter} already voted on {proposal}")]
    AlreadyVoted {
        /// The repeat voter.
        voter: Principal,
        /// The live proposal.
        proposal: ProposalId,
    },

    /// The proposal's voting window has closed.
    #[error("{proposal} expired at {deadline}")]
    Expired {
        /// The stale proposal.
        proposal: ProposalId,
        /// When voting closed.
        deadline: Timestamp,
    },

    /// There is nothing to vote on.
    #[error("no active proposal for {subject}")]
    NoActiveProposal {
        /// The identity target, or `"mint-rate"` for the singleton.
        subject: String,
    },

    /// A mint or transfer recipient is not a currently verified identity.
    #[error("recipient {recipient} is not a verified user")]
    RecipientNotVerified {
        /// The unverified recipient.
        recipient: Principal,
    },

    /// The requested amount is above the current issuance ceiling.
    #[error("minting amount {requested} exceeds TMAX {tmax}")]
    ExceedsRateLimit {
        /// Amount or batch total requested.
        requested: Amount,
        /// Ceiling in force at the time of the call.
        tmax: Amount,
    },

    /// `mint_batch` received recipient and amount lists of different lengths.
    #[error("batch has {recipients} recipients but {amounts} amounts")]
    BatchLengthMismatch {
        /// Number of recipients.
        recipients: usize,
        /// Number of amounts.
        amounts: usize,
    },

    /// The underlying ledger rejected the credit or transfer.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl GovernanceError {
    /// Short machine-readable label, used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::AlreadyVoted { .. } => "already_voted",
            Self::Expired { .. } => "expired",
            Self::NoActiveProposal { .. } => "no_active_proposal",
            Self::RecipientNotVerified { .. } => "recipient_not_verified",
            Self::ExceedsRateLimit { .. } => "exceeds_rate_limit",
            Self::BatchLengthMismatch { .. } => "batch_length_mismatch",
            Self::Ledger(_) => "ledger",
        }
    }
}
