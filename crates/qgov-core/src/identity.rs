//! # Identity Newtypes
//!
//! [`Principal`] is the 160-bit address that identifies every actor in the
//! system: administrators, issuers, minters and verified users alike.
//! [`ProposalId`] tags each proposal instance so that an overwritten
//! proposal can be told apart from its replacement in logs.
//!
//! ## Security Invariant
//!
//! Addresses are parsed once at the boundary into a fixed-size byte array.
//! Two spellings of the same address (`0xAB..` vs `ab..`) compare equal,
//! so role membership and vote de-duplication cannot be bypassed by
//! re-casing an address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QgovError;

/// Length of a principal address in bytes (160 bits).
pub const PRINCIPAL_LEN: usize = 20;

/// An opaque, globally unique 160-bit principal address.
///
/// Ordered byte-wise, which gives a deterministic enumeration order for
/// maps keyed by principal. Renders as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal([u8; PRINCIPAL_LEN]);

impl Principal {
    /// Construct a principal from raw address bytes.
    pub const fn from_bytes(bytes: [u8; PRINCIPAL_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a hex address, with or without the `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`QgovError::InvalidPrincipal`] if the input is not exactly
    /// 40 hex digits after the optional prefix.
    pub fn parse(s: &str) -> Result<Self, QgovError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != PRINCIPAL_LEN * 2 {
            return Err(QgovError::InvalidPrincipal {
                input: s.to_string(),
                reason: format!("expected {} hex digits, got {}", PRINCIPAL_LEN * 2, digits.len()),
            });
        }
        let mut bytes = [0u8; PRINCIPAL_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| QgovError::InvalidPrincipal {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// Access the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_LEN] {
        &self.0
    }

    /// The all-zero address. Never holds a role unless explicitly granted.
    pub const fn zero() -> Self {
        Self([0u8; PRINCIPAL_LEN])
    }

    /// Whether this is the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; PRINCIPAL_LEN]
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({self})")
    }
}

impl FromStr for Principal {
    type Err = QgovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = QgovError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.to_string()
    }
}

/// Unique identifier for a single proposal instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub Uuid);

impl ProposalId {
    /// Generate a new random proposal identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProposalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proposal:{}", self.0)
    }
}
