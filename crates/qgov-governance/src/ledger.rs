//! # Ledger Capability
//!
//! The balance-keeping side of issuance is an external collaborator. The
//! governance core only needs to credit recipients, move balances, and read
//! supply figures; [`Ledger`] is that contract.
//!
//! [`CappedLedger`] is an in-memory implementation with a hard supply cap,
//! used by the CLI and the test suites.
//!
//! ## Contract
//!
//! - `credit_batch` is all-or-nothing: either every credit lands or none
//!   does.
//! - `total_supply() <= cap()` at all times.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qgov_core::Principal;

use crate::Amount;

/// Failures reported by a ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Crediting would push total supply above the cap.
    #[error("credit of {requested} would exceed supply cap {cap} (current supply {total_supply})")]
    CapExceeded {
        /// Amount being credited.
        requested: Amount,
        /// Supply before the credit.
        total_supply: Amount,
        /// The cap.
        cap: Amount,
    },

    /// The sender does not hold enough.
    #[error("{holder} holds {balance}, cannot move {requested}")]
    InsufficientBalance {
        /// Sender.
        holder: Principal,
        /// Sender's balance.
        balance: Amount,
        /// Amount requested.
        requested: Amount,
    },

    /// An amount sum overflowed.
    #[error("amount overflow")]
    Overflow,
}

/// A fungible-value ledger with a global supply cap.
pub trait Ledger: Send {
    /// Credit every `(recipient, amount)` pair, atomically.
    fn credit_batch(&mut self, credits: &[(Principal, Amount)]) -> Result<(), LedgerError>;

    /// Credit a single recipient.
    fn credit(&mut self, recipient: Principal, amount: Amount) -> Result<(), LedgerError> {
        self.credit_batch(&[(recipient, amount)])
    }

    /// Move `amount` from `from` to `to`.
    fn transfer(&mut self, from: Principal, to: Principal, amount: Amount) -> Result<(), LedgerError>;

    /// Balance held by `holder`.
    fn balance_of(&self, holder: &Principal) -> Amount;

    /// Sum of all balances.
    fn total_supply(&self) -> Amount;

    /// Maximum total supply.
    fn cap(&self) -> Amount;
}

/// In-memory capped ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappedLedger {
    cap: Amount,
    total_supply: Amount,
    balances: BTreeMap<Principal, Amount>,
}

impl CappedLedger {
    /// An empty ledger with the given cap.
    pub fn new(cap: Amount) -> Self {
        Self {
            cap,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    /// Every non-zero balance, ordered by holder.
    pub fn balances(&self) -> impl Iterator<Item = (&Principal, &Amount)> {
        self.balances.iter().filter(|(_, v)| **v > 0)
    }
}

impl Ledger for CappedLedger {
    fn credit_batch(&mut self, credits: &[(Principal, Amount)]) -> Result<(), LedgerError> {
        let requested = credits
            .iter()
            .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(LedgerError::Overflow)?;
        let new_supply = self
            .total_supply
            .checked_add(requested)
            .filter(|s| *s <= self.cap)
            .ok_or(LedgerError::CapExceeded {
                requested,
                total_supply: self.total_supply,
                cap: self.cap,
            })?;
        // Individual balances are bounded by total supply, so these adds
        // cannot overflow once the supply check has passed.
        for (recipient, amount) in credits {
            let balance = self.balances.entry(*recipient).or_default();
            *balance = balance.saturating_add(*amount);
        }
        self.total_supply = new_supply;
        Ok(())
    }

    fn transfer(&mut self, from: Principal, to: Principal, amount: Amount) -> Result<(), LedgerError> {
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from,
                balance,
                requested: amount,
            });
        }
        self.balances.insert(from, balance - amount);
        let dest = self.balances.entry(to).or_default();
        *dest = dest.saturating_add(amount);
        Ok(())
    }

    fn balance_of(&self, holder: &Principal) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn cap(&self) -> Amount {
        self.cap
    }
}
