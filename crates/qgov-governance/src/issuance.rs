//! # Issuance Ledger Facade
//!
//! Every mint passes through here. A mint succeeds only if, in order:
//!
//! 1. the caller is a minting admin,
//! 2. every recipient is a currently verified identity,
//! 3. the amount (or the batch total) is at most TMAX,
//! 4. the ledger accepts the credit.
//!
//! The first failing check aborts the call with nothing credited and no
//! counter touched. On success the caller's all-time minted counter grows
//! by the amount issued. TMAX is a per-call ceiling; there is no rolling
//! window.
//!
//! Transfers are also routed here so that value can only move to
//! verified identities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qgov_core::{Principal, Timestamp};

use crate::error::{GovernanceError, Result};
use crate::identity::IdentityGovernor;
use crate::ledger::{Ledger, LedgerError};
use crate::mint_rate::MintRateGovernor;
use crate::Amount;

/// What a successful mint did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Minting admin credited with the issuance.
    pub minter: Principal,
    /// Amount issued by this call.
    pub amount: Amount,
    /// Number of recipients credited.
    pub recipients: usize,
    /// The minter's all-time total after this call.
    pub minted_by_admin: Amount,
}

/// Issuance bookkeeping in front of a [`Ledger`].
#[derive(Debug)]
pub struct IssuanceLedger<L> {
    ledger: L,
    minted_by_admin: BTreeMap<Principal, Amount>,
}

impl<L: Ledger> IssuanceLedger<L> {
    /// Wrap a ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            minted_by_admin: BTreeMap::new(),
        }
    }

    /// The wrapped ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the wrapped ledger, for genesis allocation.
    pub(crate) fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// All-time amount minted by `admin`.
    pub fn minted_by(&self, admin: &Principal) -> Amount {
        self.minted_by_admin.get(admin).copied().unwrap_or(0)
    }

    /// All-time totals for every admin that has minted.
    pub fn minted_totals(&self) -> &BTreeMap<Principal, Amount> {
        &self.minted_by_admin
    }

    /// Mint `amount` to one recipient.
    pub fn mint_one(
        &mut self,
        caller: Principal,
        recipient: Principal,
        amount: Amount,
        rate: &MintRateGovernor,
        identities: &IdentityGovernor,
        now: Timestamp,
    ) -> Result<MintReceipt> {
        rate.require_minting_admin(caller)?;
        self.mint(caller, &[(recipient, amount)], rate, identities, now)
    }

    /// Mint to several recipients in one all-or-nothing call. TMAX bounds
    /// the batch total, not each element.
    pub fn mint_batch(
        &mut self,
        caller: Principal,
        recipients: &[Principal],
        amounts: &[Amount],
        rate: &MintRateGovernor,
        identities: &IdentityGovernor,
        now: Timestamp,
    ) -> Result<MintReceipt> {
        // Role first, so an outsider learns nothing about the batch shape.
        rate.require_minting_admin(caller)?;
        if recipients.len() != amounts.len() {
            return Err(reject(GovernanceError::BatchLengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            }));
        }
        let credits: Vec<(Principal, Amount)> = recipients
            .iter()
            .copied()
            .zip(amounts.iter().copied())
            .collect();
        self.mint(caller, &credits, rate, identities, now)
    }

    /// Shared tail of both mint paths. The caller's role has been checked.
    fn mint(
        &mut self,
        caller: Principal,
        credits: &[(Principal, Amount)],
        rate: &MintRateGovernor,
        identities: &IdentityGovernor,
        now: Timestamp,
    ) -> Result<MintReceipt> {
        if let Some((recipient, _)) = credits
            .iter()
            .find(|(r, _)| !identities.is_verified(r, now))
        {
            return Err(reject(GovernanceError::RecipientNotVerified {
                recipient: *recipient,
            }));
        }

        let tmax = rate.tmax();
        let total = credits
            .iter()
            .try_fold(0 as Amount, |acc, (_, a)| acc.checked_add(*a));
        let total = match total {
            Some(t) if t <= tmax => t,
            // An overflowing sum is above any ceiling.
            Some(t) => {
                return Err(reject(GovernanceError::ExceedsRateLimit {
                    requested: t,
                    tmax,
                }))
            }
            None => {
                return Err(reject(GovernanceError::ExceedsRateLimit {
                    requested: Amount::MAX,
                    tmax,
                }))
            }
        };

        let minted = self
            .minted_by(&caller)
            .checked_add(total)
            .ok_or_else(|| reject(GovernanceError::Ledger(LedgerError::Overflow)))?;

        self.ledger.credit_batch(credits).map_err(|e| reject(e.into()))?;
        self.minted_by_admin.insert(caller, minted);

        metrics::counter!("qgov_minted_total").increment(total);
        tracing::info!(
            minter = %caller,
            amount = total,
            recipients = credits.len(),
            minted_by_admin = minted,
            "minted"
        );
        Ok(MintReceipt {
            minter: caller,
            amount: total,
            recipients: credits.len(),
            minted_by_admin: minted,
        })
    }

    /// Move `amount` from `caller` to a verified recipient.
    pub fn transfer(
        &mut self,
        caller: Principal,
        to: Principal,
        amount: Amount,
        identities: &IdentityGovernor,
        now: Timestamp,
    ) -> Result<()> {
        if !identities.is_verified(&to, now) {
            return Err(reject(GovernanceError::RecipientNotVerified { recipient: to }));
        }
        self.ledger
            .transfer(caller, to, amount)
            .map_err(|e| reject(e.into()))?;
        tracing::debug!(from = %caller, %to, amount, "transferred");
        Ok(())
    }
}

fn reject(err: GovernanceError) -> GovernanceError {
    metrics::counter!("qgov_rejections_total", "kind" => err.kind()).increment(1);
    tracing::warn!(error = %err, "issuance call rejected");
    err
}
