#![deny(missing_docs)]

//! # lexaccess-audit: Usage Auditing
//!
//! [`UsageAuditLogger`] records access decisions with per-key throttling so
//! repeated page loads of one document produce one row per window.
//! [`InMemoryUsageLog`] is the bundled sink.

pub mod memory;
pub mod usage;

pub use memory::InMemoryUsageLog;
pub use usage::{
    truncate_chars, AccessLogEntry, LogOutcome, UsageAuditLogger, AUDIT_FAILURE_COUNTER,
};
