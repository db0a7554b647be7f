//! # qgov-core: Foundational Types
//!
//! Leaf crate of the qgov workspace. Defines the primitives every other
//! crate shares: who is acting ([`Principal`]), when it happens
//! ([`Timestamp`], [`Clock`]), and how proposals are told apart
//! ([`ProposalId`]).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `qgov-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Identifiers are newtypes with validated constructors. No bare strings
//!   for addresses.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::QgovError;
pub use identity::{Principal, ProposalId, PRINCIPAL_LEN};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
