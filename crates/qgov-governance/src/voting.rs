//! # Voting Engine
//!
//! Stateless decision logic shared by both governors. A proposal's vote
//! state is a [`VoteTally`] owned by the governor that created it; this
//! module only inspects and updates a tally handed to it.
//!
//! ## Rules
//!
//! - One vote per voter per proposal. A second attempt is rejected before
//!   anything is recorded, so votes cannot be changed.
//! - A vote is rejected once `now > deadline`. A vote landing exactly on the
//!   deadline second is still accepted.
//! - Majority is strict and measured against the role population *at the
//!   time of the vote*: `yes * 2 > population`. Membership changes during a
//!   vote move the threshold.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use qgov_core::{Principal, ProposalId, Timestamp};

/// Who has voted on a proposal, how many said yes, and until when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    voters: BTreeSet<Principal>,
    yes_count: u32,
    deadline: Option<Timestamp>,
}

impl VoteTally {
    /// An empty tally. `deadline: None` never expires.
    pub fn open(deadline: Option<Timestamp>) -> Self {
        Self {
            voters: BTreeSet::new(),
            yes_count: 0,
            deadline,
        }
    }

    /// A tally that already carries a yes vote from `proposer`.
    pub fn open_with_yes(proposer: Principal, deadline: Option<Timestamp>) -> Self {
        let mut tally = Self::open(deadline);
        tally.voters.insert(proposer);
        tally.yes_count = 1;
        tally
    }

    /// Everyone who has voted, either way.
    pub fn voters(&self) -> &BTreeSet<Principal> {
        &self.voters
    }

    /// Number of yes votes.
    pub fn yes_count(&self) -> u32 {
        self.yes_count
    }

    /// When voting closes, if ever.
    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    /// Whether `voter` has already voted.
    pub fn has_voted(&self, voter: &Principal) -> bool {
        self.voters.contains(voter)
    }

    /// Whether the voting window has closed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.deadline.is_some_and(|d| now > d)
    }
}

/// Result of [`register_vote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStatus {
    /// The vote was recorded.
    Accepted,
    /// The voter had already voted; nothing changed.
    AlreadyVoted,
    /// The deadline has passed; nothing changed.
    Expired,
}

/// Record `voter`'s ballot on `tally`.
///
/// The double-vote check runs first, then the deadline check. Only an
/// `Accepted` result mutates the tally.
pub fn register_vote(
    tally: &mut VoteTally,
    voter: Principal,
    support: bool,
    now: Timestamp,
) -> VoteStatus {
    if tally.has_voted(&voter) {
        return VoteStatus::AlreadyVoted;
    }
    if tally.is_expired(now) {
        return VoteStatus::Expired;
    }
    tally.voters.insert(voter);
    if support {
        tally.yes_count = tally.yes_count.saturating_add(1);
    }
    VoteStatus::Accepted
}

/// Strict majority of the current population.
pub fn has_majority(yes_count: u32, population: usize) -> bool {
    u64::from(yes_count) * 2 > population as u64
}

/// Deadline for a proposal created at `created_at` with the given window.
pub fn deadline_after(created_at: Timestamp, window_secs: Option<u64>) -> Option<Timestamp> {
    window_secs.map(|secs| created_at.saturating_add_secs(secs))
}

/// What a successful vote did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Recorded; majority not yet reached.
    Pending,
    /// Majority reached; the proposal's effect was applied and its slot
    /// cleared in the same call.
    Applied,
}

/// Receipt for a vote (or a proposal that carries an implicit vote).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    /// The proposal voted on.
    pub proposal: ProposalId,
    /// Yes votes after this vote.
    pub yes_count: u32,
    /// Role population the majority was measured against.
    pub population: usize,
    /// Whether the proposal passed.
    pub outcome: VoteOutcome,
}

impl VoteReceipt {
    /// Build a receipt from the tally after a vote, deciding the outcome.
    pub fn evaluate(proposal: ProposalId, tally: &VoteTally, population: usize) -> Self {
        let outcome = if has_majority(tally.yes_count(), population) {
            VoteOutcome::Applied
        } else {
            VoteOutcome::Pending
        };
        Self {
            proposal,
            yes_count: tally.yes_count(),
            population,
            outcome,
        }
    }

    /// Whether the proposal passed on this vote.
    pub fn passed(&self) -> bool {
        self.outcome == VoteOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(n: u8) -> Principal {
        Principal::from_bytes([n; 20])
    }

    fn t0() -> Timestamp {
        Timestamp::parse("2026-03-01T00:00:00Z").unwrap()
    }

    // ── register_vote ────────────────────────────────────────────────

    #[test]
    fn accepted_vote_is_recorded() {
        let mut tally = VoteTally::open(None);
        assert_eq!(register_vote(&mut tally, p(1), true, t0()), VoteStatus::Accepted);
        assert!(tally.has_voted(&p(1)));
        assert_eq!(tally.yes_count(), 1);
    }

    #[test]
    fn no_vote_is_recorded_without_yes() {
        let mut tally = VoteTally::open(None);
        assert_eq!(register_vote(&mut tally, p(1), false, t0()), VoteStatus::Accepted);
        assert!(tally.has_voted(&p(1)));
        assert_eq!(tally.yes_count(), 0);
    }

    #[test]
    fn second_vote_is_rejected_and_uncounted() {
        let mut tally = VoteTally::open(None);
        register_vote(&mut tally, p(1), true, t0());
        assert_eq!(
            register_vote(&mut tally, p(1), true, t0()),
            VoteStatus::AlreadyVoted
        );
        assert_eq!(tally.yes_count(), 1);
    }

    #[test]
    fn changing_a_vote_is_rejected() {
        let mut tally = VoteTally::open(None);
        register_vote(&mut tally, p(1), false, t0());
        assert_eq!(
            register_vote(&mut tally, p(1), true, t0()),
            VoteStatus::AlreadyVoted
        );
        assert_eq!(tally.yes_count(), 0);
    }

    #[test]
    fn already_voted_takes_precedence_over_expiry() {
        let deadline = t0().checked_add_secs(10).unwrap();
        let mut tally = VoteTally::open_with_yes(p(1), Some(deadline));
        let late = deadline.checked_add_secs(1).unwrap();
        assert_eq!(
            register_vote(&mut tally, p(1), true, late),
            VoteStatus::AlreadyVoted
        );
    }

    #[test]
    fn vote_on_deadline_second_is_accepted() {
        let deadline = t0().checked_add_secs(86_400).unwrap();
        let mut tally = VoteTally::open(Some(deadline));
        assert_eq!(register_vote(&mut tally, p(2), true, deadline), VoteStatus::Accepted);
    }

    #[test]
    fn vote_after_deadline_is_expired() {
        let deadline = t0().checked_add_secs(86_400).unwrap();
        let mut tally = VoteTally::open(Some(deadline));
        let late = deadline.checked_add_secs(1).unwrap();
        assert_eq!(register_vote(&mut tally, p(2), true, late), VoteStatus::Expired);
        assert!(tally.voters().is_empty());
    }

    #[test]
    fn open_with_yes_counts_proposer() {
        let tally = VoteTally::open_with_yes(p(7), None);
        assert_eq!(tally.yes_count(), 1);
        assert!(tally.has_voted(&p(7)));
    }

    #[test]
    fn no_deadline_never_expires() {
        let tally = VoteTally::open(None);
        assert!(!tally.is_expired(t0().saturating_add_secs(u64::MAX)));
    }

    // ── has_majority ─────────────────────────────────────────────────

    #[test]
    fn majority_of_four() {
        assert!(!has_majority(2, 4));
        assert!(has_majority(3, 4));
    }

    #[test]
    fn majority_of_odd_population() {
        assert!(!has_majority(1, 3));
        assert!(has_majority(2, 3));
        assert!(has_majority(1, 1));
    }

    #[test]
    fn empty_population_passes_any_yes() {
        assert!(!has_majority(0, 0));
        assert!(has_majority(1, 0));
    }

    // ── receipts ─────────────────────────────────────────────────────

    #[test]
    fn receipt_reflects_majority() {
        let mut tally = VoteTally::open(None);
        for n in 0..3 {
            register_vote(&mut tally, p(n), true, t0());
        }
        let id = ProposalId::new();
        assert!(VoteReceipt::evaluate(id, &tally, 4).passed());
        assert!(!VoteReceipt::evaluate(id, &tally, 6).passed());
    }

    #[test]
    fn deadline_after_window() {
        assert_eq!(deadline_after(t0(), None), None);
        assert_eq!(
            deadline_after(t0(), Some(60)).unwrap().epoch_secs(),
            t0().epoch_secs() + 60
        );
    }

    proptest! {
        /// `has_majority` is exactly integer strict majority.
        #[test]
        fn majority_matches_integer_half(yes in 0u32..1000, population in 0usize..1000) {
            prop_assert_eq!(has_majority(yes, population), (yes as usize) > population / 2);
        }

        /// Repeat votes never move the yes count.
        #[test]
        fn repeat_votes_are_inert(ballots in proptest::collection::vec((0u8..6, any::<bool>()), 1..50)) {
            let mut tally = VoteTally::open(None);
            let mut first: std::collections::BTreeMap<u8, bool> = Default::default();
            for (voter, support) in ballots {
                let status = register_vote(&mut tally, p(voter), support, t0());
                if first.contains_key(&voter) {
                    prop_assert_eq!(status, VoteStatus::AlreadyVoted);
                } else {
                    prop_assert_eq!(status, VoteStatus::Accepted);
                    first.insert(voter, support);
                }
            }
            let expected = first.values().filter(|s| **s).count() as u32;
            prop_assert_eq!(tally.yes_count(), expected);
        }
    }
}
