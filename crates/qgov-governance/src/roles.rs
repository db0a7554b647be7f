//! # Role Registry
//!
//! Named role memberships. Each role maps to an insertion-ordered set of
//! principals, so that `list` yields the same roster every time (admin
//! rosters are enumerated by index off-line).
//!
//! The registry is mechanism only. It never checks who is asking; the
//! governor that owns a registry decides which [`Authority`] may grant or
//! revoke each role.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qgov_core::Principal;

/// A privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Votes on identity proposals.
    IssuerAdmin,
    /// Adds and revokes identities unilaterally, and administers both
    /// identity roles.
    TrustedIssuer,
    /// Mints, and votes on changes to the issuance ceiling.
    MintingAdmin,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 3] = [Role::IssuerAdmin, Role::TrustedIssuer, Role::MintingAdmin];

    /// Stable string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssuerAdmin => "issuer_admin",
            Self::TrustedIssuer => "trusted_issuer",
            Self::MintingAdmin => "minting_admin",
        }
    }

    /// Parse a role from its string name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    /// Who may grant or revoke this role.
    pub fn admin_authority(&self) -> Authority {
        match self {
            Self::IssuerAdmin | Self::TrustedIssuer => Authority::Role(Role::TrustedIssuer),
            Self::MintingAdmin => Authority::Owner,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permission an operation can demand of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// Membership in a role.
    Role(Role),
    /// The single bootstrap principal that administers the minting role.
    Owner,
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role {role}"),
            Self::Owner => f.write_str("owner authority"),
        }
    }
}

/// Role → ordered member set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    members: BTreeMap<Role, Vec<Principal>>,
}

impl RoleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `principal` to `role`. Idempotent.
    ///
    /// Returns `true` if the principal was not already a member.
    pub fn grant(&mut self, role: Role, principal: Principal) -> bool {
        let set = self.members.entry(role).or_default();
        if set.contains(&principal) {
            return false;
        }
        set.push(principal);
        true
    }

    /// Remove `principal` from `role`. Revoking a non-member is a no-op.
    ///
    /// Returns `true` if the principal was a member. Remaining members keep
    /// their relative order.
    pub fn revoke(&mut self, role: Role, principal: &Principal) -> bool {
        let Some(set) = self.members.get_mut(&role) else {
            return false;
        };
        let before = set.len();
        set.retain(|p| p != principal);
        set.len() != before
    }

    /// Whether `principal` holds `role`.
    pub fn has(&self, role: Role, principal: &Principal) -> bool {
        self.members
            .get(&role)
            .is_some_and(|set| set.contains(principal))
    }

    /// Members of `role` in grant order.
    pub fn list(&self, role: Role) -> &[Principal] {
        self.members.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of members in `role`.
    pub fn count(&self, role: Role) -> usize {
        self.list(role).len()
    }

    /// Member at position `index` of `role`'s roster.
    pub fn member_at(&self, role: Role, index: usize) -> Option<Principal> {
        self.list(role).get(index).copied()
    }
}
