//! # Identity Lifecycle Governor
//!
//! Owns the identity records of verified users and the proposals that
//! change them.
//!
//! ## Per-target proposal lifecycle
//!
//! ```text
//! NoProposal ──propose*──▶ Proposed(action) ──majority──▶ Applied (slot cleared)
//!                               │
//!                               └──propose*──▶ Overwritten (new proposal in slot)
//! ```
//!
//! Proposals are created by issuer admins and need a strict majority of
//! the *current* issuer-admin roster. The proposer does not vote by
//! proposing. Trusted issuers can bypass voting entirely with
//! [`IdentityGovernor::force_add`] / [`IdentityGovernor::force_revoke`].
//!
//! ## Known hazard: stale proposals after a forced change
//!
//! The force paths do not look at, or clear, a pending proposal for the
//! same target. A proposal to add a user who was then force-revoked will
//! still re-add them if it later reaches majority.
//!
//! ## Expiry
//!
//! Verification is time-gated. A record counts as verified only while
//! `now < expires_at`; nothing sweeps expired records. Identity proposals
//! themselves never expire unless [`IdentityPolicy::voting_window_secs`]
//! is set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qgov_core::{Principal, ProposalId, Timestamp};

use crate::error::{GovernanceError, Result};
use crate::roles::{Authority, Role, RoleRegistry};
use crate::voting::{self, VoteReceipt, VoteStatus, VoteTally};

// ─── Records ─────────────────────────────────────────────────────────

/// Stored verification state for one principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// The stored flag. Read through [`IdentityRecord::is_verified_at`].
    pub verified: bool,
    /// Verification lapses at this instant.
    pub expires_at: Timestamp,
}

impl IdentityRecord {
    /// Whether the record counts as verified at `now`.
    pub fn is_verified_at(&self, now: Timestamp) -> bool {
        self.verified && now < self.expires_at
    }
}

// ─── Proposals ───────────────────────────────────────────────────────

/// New expiry for a renewal, tagged with how to read it.
///
/// Both shapes are accepted; neither is converted into the other. A
/// relative expiry is resolved when the renewal takes effect, not when it
/// is proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpirySpec {
    /// Expire at this instant.
    Absolute {
        /// The new expiry.
        at: Timestamp,
    },
    /// Expire this many seconds after the renewal is applied.
    Relative {
        /// Offset from the moment of application.
        secs: u64,
    },
}

impl ExpirySpec {
    /// Resolve to an absolute instant, given the time of application.
    pub fn resolve(&self, applied_at: Timestamp) -> Timestamp {
        match self {
            Self::Absolute { at } => *at,
            Self::Relative { secs } => applied_at.saturating_add_secs(*secs),
        }
    }
}

/// What an identity proposal would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IdentityAction {
    /// Verify the target until `expires_at`.
    Add {
        /// Absolute expiry of the new verification.
        expires_at: Timestamp,
    },
    /// Clear the target's verified flag; expiry is kept.
    Revoke,
    /// Move the target's expiry.
    Renew {
        /// The new expiry.
        expiry: ExpirySpec,
    },
}

impl IdentityAction {
    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Revoke => "revoke",
            Self::Renew { .. } => "renew",
        }
    }
}

/// A pending identity change for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProposal {
    /// Identifies this proposal instance.
    pub id: ProposalId,
    /// The principal whose record would change.
    pub target: Principal,
    /// The change.
    pub action: IdentityAction,
    /// Issuer admin who proposed it.
    pub proposer: Principal,
    /// When it was proposed.
    pub created_at: Timestamp,
    /// Votes so far.
    pub tally: VoteTally,
}

/// Tunable identity governance behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPolicy {
    /// Voting window for identity proposals. `None` means proposals stay
    /// open until overwritten or applied.
    pub voting_window_secs: Option<u64>,
}

// ─── Governor ────────────────────────────────────────────────────────

/// Identity records, per-target proposals, and the two identity roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityGovernor {
    roles: RoleRegistry,
    records: BTreeMap<Principal, IdentityRecord>,
    proposals: BTreeMap<Principal, IdentityProposal>,
    policy: IdentityPolicy,
}

impl IdentityGovernor {
    /// An empty governor with no roles, identities or proposals.
    pub fn new(policy: IdentityPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Install a role member without an authorization check (genesis only).
    pub(crate) fn install_role(&mut self, role: Role, principal: Principal) {
        self.roles.grant(role, principal);
    }

    /// Install a verified identity without an authorization check (genesis only).
    pub(crate) fn install_identity(&mut self, principal: Principal, expires_at: Timestamp) {
        self.records.insert(
            principal,
            IdentityRecord {
                verified: true,
                expires_at,
            },
        );
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Whether `target` is verified at `now` (lazy expiry).
    pub fn is_verified(&self, target: &Principal, now: Timestamp) -> bool {
        self.records
            .get(target)
            .is_some_and(|r| r.is_verified_at(now))
    }

    /// The raw stored record, ignoring expiry.
    pub fn record(&self, target: &Principal) -> Option<&IdentityRecord> {
        self.records.get(target)
    }

    /// The pending proposal for `target`, if any.
    pub fn proposal(&self, target: &Principal) -> Option<&IdentityProposal> {
        self.proposals.get(target)
    }

    /// Every pending proposal, ordered by target.
    pub fn proposals(&self) -> impl Iterator<Item = &IdentityProposal> {
        self.proposals.values()
    }

    /// All stored records, ordered by principal.
    pub fn records(&self) -> impl Iterator<Item = (&Principal, &IdentityRecord)> {
        self.records.iter()
    }

    /// Identity role memberships.
    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    /// The configured policy.
    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    // ── Proposals ────────────────────────────────────────────────────

    /// Propose verifying `target` until `expires_at`.
    pub fn propose_add(
        &mut self,
        caller: Principal,
        target: Principal,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<ProposalId> {
        self.require(Role::IssuerAdmin, caller)?;
        Ok(self.open_proposal(caller, target, IdentityAction::Add { expires_at }, now))
    }

    /// Propose revoking `target`.
    pub fn propose_revoke(
        &mut self,
        caller: Principal,
        target: Principal,
        now: Timestamp,
    ) -> Result<ProposalId> {
        self.require(Role::IssuerAdmin, caller)?;
        Ok(self.open_proposal(caller, target, IdentityAction::Revoke, now))
    }

    /// Propose moving `target`'s expiry.
    pub fn propose_renew(
        &mut self,
        caller: Principal,
        target: Principal,
        expiry: ExpirySpec,
        now: Timestamp,
    ) -> Result<ProposalId> {
        self.require(Role::IssuerAdmin, caller)?;
        Ok(self.open_proposal(caller, target, IdentityAction::Renew { expiry }, now))
    }

    fn open_proposal(
        &mut self,
        proposer: Principal,
        target: Principal,
        action: IdentityAction,
        now: Timestamp,
    ) -> ProposalId {
        let proposal = IdentityProposal {
            id: ProposalId::new(),
            target,
            action,
            proposer,
            created_at: now,
            tally: VoteTally::open(voting::deadline_after(now, self.policy.voting_window_secs)),
        };
        let id = proposal.id;
        if let Some(previous) = self.proposals.insert(target, proposal) {
            tracing::debug!(
                %target,
                replaced = %previous.id,
                replaced_action = previous.action.as_str(),
                "identity proposal overwritten"
            );
        }
        tracing::debug!(%target, proposal = %id, action = action.as_str(), %proposer, "identity proposal opened");
        id
    }

    /// Vote on the pending proposal for `target`.
    ///
    /// If this vote brings the yes count to a strict majority of the
    /// current issuer-admin roster, the action is applied and the slot
    /// cleared before returning.
    pub fn cast_vote(
        &mut self,
        caller: Principal,
        target: Principal,
        support: bool,
        now: Timestamp,
    ) -> Result<VoteReceipt> {
        self.require(Role::IssuerAdmin, caller)?;
        let population = self.roles.count(Role::IssuerAdmin);

        let proposal = self
            .proposals
            .get_mut(&target)
            .ok_or_else(|| GovernanceError::NoActiveProposal {
                subject: target.to_string(),
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
                    // An expired tally always has a deadline.
                    deadline: proposal.tally.deadline().unwrap_or(now),
                })
            }
        }

        metrics::counter!("qgov_votes_total", "subject" => "identity").increment(1);
        let receipt = VoteReceipt::evaluate(proposal.id, &proposal.tally, population);
        tracing::debug!(
            %target,
            proposal = %receipt.proposal,
            voter = %caller,
            support,
            yes = receipt.yes_count,
            population,
            "identity vote recorded"
        );

        if receipt.passed() {
            if let Some(passed) = self.proposals.remove(&target) {
                self.apply(target, passed.action, now);
                metrics::counter!("qgov_proposals_applied_total", "subject" => "identity")
                    .increment(1);
                tracing::info!(
                    %target,
                    proposal = %passed.id,
                    action = passed.action.as_str(),
                    "identity proposal passed"
                );
            }
        }
        Ok(receipt)
    }

    fn apply(&mut self, target: Principal, action: IdentityAction, now: Timestamp) {
        match action {
            IdentityAction::Add { expires_at } => {
                self.records.insert(
                    target,
                    IdentityRecord {
                        verified: true,
                        expires_at,
                    },
                );
            }
            IdentityAction::Revoke => {
                if let Some(record) = self.records.get_mut(&target) {
                    record.verified = false;
                }
            }
            IdentityAction::Renew { expiry } => match self.records.get_mut(&target) {
                Some(record) => record.expires_at = expiry.resolve(now),
                None => tracing::warn!(%target, "renewal passed for a principal with no identity record"),
            },
        }
    }

    // ── Force paths ──────────────────────────────────────────────────

    /// Verify `target` immediately. Pending proposals are left untouched.
    pub fn force_add(
        &mut self,
        caller: Principal,
        target: Principal,
        expires_at: Timestamp,
    ) -> Result<()> {
        self.require(Role::TrustedIssuer, caller)?;
        self.records.insert(
            target,
            IdentityRecord {
                verified: true,
                expires_at,
            },
        );
        self.warn_if_stale(target);
        tracing::info!(%target, %expires_at, issuer = %caller, "identity force-added");
        Ok(())
    }

    /// Revoke `target` immediately. Pending proposals are left untouched.
    pub fn force_revoke(&mut self, caller: Principal, target: Principal) -> Result<()> {
        self.require(Role::TrustedIssuer, caller)?;
        if let Some(record) = self.records.get_mut(&target) {
            record.verified = false;
        }
        self.warn_if_stale(target);
        tracing::info!(%target, issuer = %caller, "identity force-revoked");
        Ok(())
    }

    fn warn_if_stale(&self, target: Principal) {
        if let Some(pending) = self.proposals.get(&target) {
            tracing::warn!(
                %target,
                proposal = %pending.id,
                action = pending.action.as_str(),
                "forced identity change left a pending proposal in place"
            );
        }
    }

    // ── Role administration ──────────────────────────────────────────

    /// Grant an identity role. Requires the trusted-issuer role.
    pub fn grant_role(&mut self, caller: Principal, role: Role, principal: Principal) -> Result<bool> {
        self.require_admin_of(role, caller)?;
        let added = self.roles.grant(role, principal);
        tracing::info!(%role, %principal, by = %caller, added, "identity role granted");
        Ok(added)
    }

    /// Revoke an identity role. Requires the trusted-issuer role.
    pub fn revoke_role(&mut self, caller: Principal, role: Role, principal: Principal) -> Result<bool> {
        self.require_admin_of(role, caller)?;
        let removed = self.roles.revoke(role, &principal);
        tracing::info!(%role, %principal, by = %caller, removed, "identity role revoked");
        Ok(removed)
    }

    /// Add an issuer admin.
    pub fn add_issuer_admin(&mut self, caller: Principal, principal: Principal) -> Result<bool> {
        self.grant_role(caller, Role::IssuerAdmin, principal)
    }

    /// Remove an issuer admin.
    pub fn remove_issuer_admin(&mut self, caller: Principal, principal: Principal) -> Result<bool> {
        self.revoke_role(caller, Role::IssuerAdmin, principal)
    }

    /// Add a trusted issuer.
    pub fn add_trusted_issuer(&mut self, caller: Principal, principal: Principal) -> Result<bool> {
        self.grant_role(caller, Role::TrustedIssuer, principal)
    }

    /// Remove a trusted issuer.
    pub fn remove_trusted_issuer(&mut self, caller: Principal, principal: Principal) -> Result<bool> {
        self.revoke_role(caller, Role::TrustedIssuer, principal)
    }

    fn require_admin_of(&self, role: Role, caller: Principal) -> Result<()> {
        match role.admin_authority() {
            Authority::Role(admin) => self.require(admin, caller),
            required => Err(GovernanceError::Unauthorized { caller, required }),
        }
    }

    fn require(&self, role: Role, caller: Principal) -> Result<()> {
        if self.roles.has(role, &caller) {
            return Ok(());
        }
        metrics::counter!("qgov_rejections_total", "kind" => "unauthorized").increment(1);
        tracing::warn!(%caller, %role, "identity call rejected: missing role");
        Err(GovernanceError::Unauthorized {
            caller,
            required: Authority::Role(role),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u8) -> Principal {
        Principal::from_bytes([n; 20])
    }

    fn t0() -> Timestamp {
        Timestamp::parse("2026-03-01T00:00:00Z").unwrap()
    }

    fn hours(h: u64) -> Timestamp {
        t0().checked_add_secs(h * 3600).unwrap()
    }

    const TRUSTED: u8 = 100;
    const TARGET: u8 = 50;

    /// Governor with issuer admins p(0)..p(n) and trusted issuer p(100).
    fn governor(admins: u8) -> IdentityGovernor {
        let mut gov = IdentityGovernor::new(IdentityPolicy::default());
        gov.install_role(Role::TrustedIssuer, p(TRUSTED));
        for n in 0..admins {
            gov.install_role(Role::IssuerAdmin, p(n));
        }
        gov
    }

    fn vote_all(gov: &mut IdentityGovernor, voters: &[u8], target: Principal) {
        for v in voters {
            gov.cast_vote(p(*v), target, true, t0()).unwrap();
        }
    }

    // ── Majority flow ────────────────────────────────────────────────

    #[test]
    fn proposer_does_not_vote_implicitly() {
        let mut gov = governor(4);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        let proposal = gov.proposal(&p(TARGET)).unwrap();
        assert_eq!(proposal.tally.yes_count(), 0);
        assert!(proposal.tally.voters().is_empty());
    }

    #[test]
    fn add_applies_on_majority_vote() {
        let mut gov = governor(4);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();

        let r = gov.cast_vote(p(0), p(TARGET), true, t0()).unwrap();
        assert!(!r.passed());
        assert!(!gov.is_verified(&p(TARGET), t0()));

        gov.cast_vote(p(1), p(TARGET), true, t0()).unwrap();
        assert!(!gov.is_verified(&p(TARGET), t0()));

        let r = gov.cast_vote(p(2), p(TARGET), true, t0()).unwrap();
        assert!(r.passed());
        assert_eq!(r.yes_count, 3);
        assert!(gov.is_verified(&p(TARGET), t0()));
        assert!(gov.proposal(&p(TARGET)).is_none());
    }

    #[test]
    fn no_votes_do_not_count_toward_majority() {
        let mut gov = governor(3);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        gov.cast_vote(p(0), p(TARGET), false, t0()).unwrap();
        gov.cast_vote(p(1), p(TARGET), true, t0()).unwrap();
        assert!(!gov.is_verified(&p(TARGET), t0()));
        let r = gov.cast_vote(p(2), p(TARGET), true, t0()).unwrap();
        assert!(r.passed());
    }

    #[test]
    fn revoke_keeps_record_and_expiry() {
        let mut gov = governor(3);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        vote_all(&mut gov, &[0, 1], p(TARGET));
        assert!(gov.is_verified(&p(TARGET), t0()));

        gov.propose_revoke(p(0), p(TARGET), t0()).unwrap();
        assert!(gov.is_verified(&p(TARGET), t0()));
        vote_all(&mut gov, &[1, 2], p(TARGET));

        assert!(!gov.is_verified(&p(TARGET), t0()));
        let record = gov.record(&p(TARGET)).unwrap();
        assert!(!record.verified);
        assert_eq!(record.expires_at, hours(1));
    }

    #[test]
    fn renew_absolute_sets_expiry() {
        let mut gov = governor(3);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        vote_all(&mut gov, &[0, 1], p(TARGET));

        gov.propose_renew(p(0), p(TARGET), ExpirySpec::Absolute { at: hours(2) }, t0())
            .unwrap();
        vote_all(&mut gov, &[0, 1], p(TARGET));
        assert_eq!(gov.record(&p(TARGET)).unwrap().expires_at, hours(2));
        assert!(gov.is_verified(&p(TARGET), hours(1)));
    }

    #[test]
    fn renew_relative_resolves_at_application() {
        let mut gov = governor(3);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        vote_all(&mut gov, &[0, 1], p(TARGET));

        gov.propose_renew(p(0), p(TARGET), ExpirySpec::Relative { secs: 7200 }, t0())
            .unwrap();
        gov.cast_vote(p(0), p(TARGET), true, t0()).unwrap();
        gov.cast_vote(p(1), p(TARGET), true, hours(1)).unwrap();
        assert_eq!(gov.record(&p(TARGET)).unwrap().expires_at, hours(3));
    }

    #[test]
    fn renew_of_unknown_principal_creates_nothing() {
        let mut gov = governor(1);
        gov.propose_renew(p(0), p(TARGET), ExpirySpec::Absolute { at: hours(5) }, t0())
            .unwrap();
        let r = gov.cast_vote(p(0), p(TARGET), true, t0()).unwrap();
        assert!(r.passed());
        assert!(gov.record(&p(TARGET)).is_none());
    }

    #[test]
    fn renewal_does_not_reinstate_a_revoked_user() {
        let mut gov = governor(1);
        gov.force_add(p(TRUSTED), p(TARGET), hours(1)).unwrap();
        gov.force_revoke(p(TRUSTED), p(TARGET)).unwrap();
        gov.propose_renew(p(0), p(TARGET), ExpirySpec::Absolute { at: hours(9) }, t0())
            .unwrap();
        gov.cast_vote(p(0), p(TARGET), true, t0()).unwrap();
        assert!(!gov.is_verified(&p(TARGET), t0()));
        assert_eq!(gov.record(&p(TARGET)).unwrap().expires_at, hours(9));
    }

    // ── Vote rejections ──────────────────────────────────────────────

    #[test]
    fn double_vote_rejected() {
        let mut gov = governor(4);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        gov.cast_vote(p(1), p(TARGET), true, t0()).unwrap();
        let err = gov.cast_vote(p(1), p(TARGET), true, t0()).unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyVoted { .. }));
        assert_eq!(gov.proposal(&p(TARGET)).unwrap().tally.yes_count(), 1);
    }

    #[test]
    fn vote_without_proposal_rejected() {
        let mut gov = governor(2);
        let err = gov.cast_vote(p(0), p(TARGET), true, t0()).unwrap_err();
        assert!(matches!(err, GovernanceError::NoActiveProposal { .. }));
    }

    #[test]
    fn unauthorized_checked_before_proposal_lookup() {
        let mut gov = governor(2);
        let err = gov.cast_vote(p(9), p(TARGET), true, t0()).unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized { .. }));
    }

    #[test]
    fn non_admin_cannot_propose() {
        let mut gov = governor(2);
        let err = gov.propose_add(p(9), p(TARGET), hours(1), t0()).unwrap_err();
        assert_eq!(
            err,
            GovernanceError::Unauthorized {
                caller: p(9),
                required: Authority::Role(Role::IssuerAdmin),
            }
        );
        assert!(gov.proposal(&p(TARGET)).is_none());
    }

    #[test]
    fn proposals_never_expire_by_default() {
        let mut gov = governor(1);
        gov.propose_add(p(0), p(TARGET), hours(10_000), t0()).unwrap();
        let r = gov.cast_vote(p(0), p(TARGET), true, hours(5000)).unwrap();
        assert!(r.passed());
    }

    #[test]
    fn configured_window_expires_proposals() {
        let mut gov = IdentityGovernor::new(IdentityPolicy {
            voting_window_secs: Some(3600),
        });
        gov.install_role(Role::IssuerAdmin, p(0));
        gov.propose_add(p(0), p(TARGET), hours(10), t0()).unwrap();
        let late = hours(1).checked_add_secs(1).unwrap();
        let err = gov.cast_vote(p(0), p(TARGET), true, late).unwrap_err();
        assert!(matches!(err, GovernanceError::Expired { deadline, .. } if deadline == hours(1)));
    }

    // ── Overwrite semantics ──────────────────────────────────────────

    #[test]
    fn new_proposal_overwrites_and_resets_votes() {
        let mut gov = governor(4);
        let first = gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        vote_all(&mut gov, &[0, 1], p(TARGET));
        let second = gov.propose_revoke(p(2), p(TARGET), t0()).unwrap();
        assert_ne!(first, second);
        let proposal = gov.proposal(&p(TARGET)).unwrap();
        assert_eq!(proposal.action, IdentityAction::Revoke);
        assert_eq!(proposal.tally.yes_count(), 0);
        // p(0) may vote again on the fresh proposal.
        gov.cast_vote(p(0), p(TARGET), true, t0()).unwrap();
    }

    #[test]
    fn majority_tracks_live_roster() {
        let mut gov = governor(4);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        vote_all(&mut gov, &[0, 1], p(TARGET));
        assert!(!gov.is_verified(&p(TARGET), t0()));

        gov.remove_issuer_admin(p(TRUSTED), p(3)).unwrap();
        // 3 admins now; the next yes makes 3 of 3.
        let r = gov.cast_vote(p(2), p(TARGET), true, t0()).unwrap();
        assert_eq!(r.population, 3);
        assert!(r.passed());
    }

    // ── Force paths ──────────────────────────────────────────────────

    #[test]
    fn force_add_and_revoke() {
        let mut gov = governor(0);
        gov.force_add(p(TRUSTED), p(TARGET), hours(1)).unwrap();
        assert!(gov.is_verified(&p(TARGET), t0()));
        gov.force_revoke(p(TRUSTED), p(TARGET)).unwrap();
        assert!(!gov.is_verified(&p(TARGET), t0()));
        assert!(gov.record(&p(TARGET)).is_some());
    }

    #[test]
    fn force_paths_require_trusted_issuer() {
        let mut gov = governor(2);
        let err = gov.force_add(p(0), p(TARGET), hours(1)).unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized { .. }));
        let err = gov.force_revoke(p(0), p(TARGET)).unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized { .. }));
    }

    #[test]
    fn force_revoke_leaves_pending_add_stale() {
        let mut gov = governor(1);
        gov.propose_add(p(0), p(TARGET), hours(1), t0()).unwrap();
        gov.force_revoke(p(TRUSTED), p(TARGET)).unwrap();
        assert!(gov.proposal(&p(TARGET)).is_some());
        gov.cast_vote(p(0), p(TARGET), true, t0()).unwrap();
        assert!(gov.is_verified(&p(TARGET), t0()));
    }

    #[test]
    fn force_revoke_of_unknown_principal_is_noop() {
        let mut gov = governor(0);
        gov.force_revoke(p(TRUSTED), p(TARGET)).unwrap();
        assert!(gov.record(&p(TARGET)).is_none());
    }

    // ── Lazy expiry ──────────────────────────────────────────────────

    #[test]
    fn verification_lapses_with_time_alone() {
        let mut gov = governor(0);
        gov.force_add(p(TRUSTED), p(TARGET), hours(1)).unwrap();
        let just_before = hours(1).epoch_secs() - 1;
        assert!(gov.is_verified(&p(TARGET), Timestamp::from_epoch_secs(just_before).unwrap()));
        assert!(!gov.is_verified(&p(TARGET), hours(1)));
        assert!(gov.record(&p(TARGET)).unwrap().verified);
    }

    #[test]
    fn unknown_principal_is_unverified() {
        let gov = governor(0);
        assert!(!gov.is_verified(&p(TARGET), t0()));
    }

    // ── Role administration ──────────────────────────────────────────

    #[test]
    fn trusted_issuer_administers_identity_roles() {
        let mut gov = governor(0);
        assert!(gov.add_issuer_admin(p(TRUSTED), p(1)).unwrap());
        assert!(!gov.add_issuer_admin(p(TRUSTED), p(1)).unwrap());
        assert!(gov.add_trusted_issuer(p(TRUSTED), p(2)).unwrap());
        assert!(gov.roles().has(Role::TrustedIssuer, &p(2)));
        assert!(gov.remove_issuer_admin(p(TRUSTED), p(1)).unwrap());
        assert!(gov.remove_trusted_issuer(p(2), p(2)).unwrap());
        assert!(!gov.roles().has(Role::TrustedIssuer, &p(2)));
    }

    #[test]
    fn issuer_admin_cannot_grant_roles() {
        let mut gov = governor(1);
        let err = gov.add_issuer_admin(p(0), p(5)).unwrap_err();
        assert!(matches!(err, GovernanceError::Unauthorized { .. }));
        assert!(!gov.roles().has(Role::IssuerAdmin, &p(5)));
    }

    #[test]
    fn minting_role_is_not_administered_here() {
        let mut gov = governor(0);
        let err = gov.grant_role(p(TRUSTED), Role::MintingAdmin, p(1)).unwrap_err();
        assert_eq!(
            err,
            GovernanceError::Unauthorized {
                caller: p(TRUSTED),
                required: Authority::Owner,
            }
        );
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn expiry_spec_is_tagged() {
        let json = serde_json::to_string(&ExpirySpec::Relative { secs: 7200 }).unwrap();
        assert_eq!(json, r#"{"kind":"relative","secs":7200}"#);
        let parsed: ExpirySpec =
            serde_json::from_str(r#"{"kind":"absolute","at":"2026-03-01T00:00:00Z"}"#).unwrap();
        assert_eq!(parsed, ExpirySpec::Absolute { at: t0() });
        assert!(serde_json::from_str::<ExpirySpec>(r#"{"secs":7200}"#).is_err());
    }
}
