//! # Error Hierarchy
//!
//! Structured error types for lexaccess, built with `thiserror`.
//!
//! A denied entitlement is **not** an error. `Decision` values carry denials.
//! The types here exist so that "we could not determine anything" (a store
//! outage, a spent read budget) is never confused with "we determined you
//! are denied".

use thiserror::Error;

/// Failure of the engine to reach a decision.
///
/// Callers must not map any variant of this type to allow or deny. The
/// correct response is a retryable failure of the surrounding request.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A collaborator store failed while the engine was reading from it.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The read budget's deadline passed before the named stage ran.
    #[error("deadline exceeded before {stage}")]
    DeadlineExceeded {
        /// The read stage that was about to run.
        stage: &'static str,
    },

    /// The caller cancelled the evaluation before the named stage ran.
    #[error("evaluation cancelled before {stage}")]
    Cancelled {
        /// The read stage that was about to run.
        stage: &'static str,
    },
}

/// Errors raised by collaborator store implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("{store} unavailable: {reason}")]
    Unavailable {
        /// Which store failed (e.g. "subscription store").
        store: &'static str,
        /// Human-readable cause.
        reason: String,
    },

    /// The store returned a row that violates its own schema.
    #[error("{store} returned a corrupt row: {reason}")]
    Corrupt {
        /// Which store failed.
        store: &'static str,
        /// Human-readable cause.
        reason: String,
    },
}

/// Validation errors for identifier parsing and snapshot loading.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// An identifier claim could not be parsed as a positive integer id.
    #[error("invalid {kind} id: \"{value}\" (expected a positive integer)")]
    InvalidId {
        /// The identifier kind (e.g. "principal").
        kind: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },

    /// A timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A snapshot document could not be decoded.
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}
