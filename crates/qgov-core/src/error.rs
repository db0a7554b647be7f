//! # Error Types
//!
//! Errors raised while constructing or parsing core primitives. Domain
//! failures (authorization, voting, issuance) live in `qgov-governance`.

use thiserror::Error;

/// Top-level error type for core primitives.
#[derive(Error, Debug)]
pub enum QgovError {
    /// A principal address could not be parsed.
    #[error("invalid principal {input:?}: {reason}")]
    InvalidPrincipal {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp could not be parsed or is out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
