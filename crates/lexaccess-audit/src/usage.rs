//! # Usage Audit Logger
//!
//! Records access decisions as [`UsageEvent`] rows, at most one per
//! (principal, content item, surface) inside a sliding throttle window.
//!
//! Auditing never interferes with the request it describes: sink failures
//! are logged, counted on `lexaccess_usage_audit_failures_total`, and
//! reported as [`LogOutcome::Failed`]. Nothing propagates.
//!
//! The existence check and the insert are not atomic. Two concurrent calls
//! for the same key may both insert; the duplicate is harmless.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lexaccess_core::{
    AuditConfig, ContentItemId, DenyReason, InstitutionId, Principal, PrincipalId, StoreError,
    UsageEvent, UsageEventSink,
};

/// Metric name for swallowed sink failures.
pub const AUDIT_FAILURE_COUNTER: &str = "lexaccess_usage_audit_failures_total";

/// Longest throttle window accepted from configuration (one year).
const MAX_WINDOW_SECS: i64 = 365 * 24 * 60 * 60;

/// One access to record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Who accessed.
    pub principal_id: PrincipalId,
    /// The principal's institution at access time.
    pub institution_id: Option<InstitutionId>,
    /// What was accessed.
    pub content_item_id: ContentItemId,
    /// Whether access was granted.
    pub allowed: bool,
    /// Deny reason identifier or free-form reason.
    pub reason: String,
    /// Where the access happened (e.g. "reader", "download").
    pub surface: String,
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

impl AccessLogEntry {
    /// An entry for a decision that ended with `reason`.
    ///
    /// Access counts as allowed exactly when `reason` is
    /// [`DenyReason::None`].
    pub fn from_outcome(
        principal: &Principal,
        content_item_id: ContentItemId,
        surface: impl Into<String>,
        reason: DenyReason,
    ) -> Self {
        Self {
            principal_id: principal.id,
            institution_id: principal.institution_id,
            content_item_id,
            allowed: reason == DenyReason::None,
            reason: reason.as_str().to_string(),
            surface: surface.into(),
            ip_address: None,
            user_agent: None,
        }
    }

    /// Attach client details.
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// What [`UsageAuditLogger::log_once`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOutcome {
    /// A new row was written.
    Inserted,
    /// A row for the same key already exists inside the window.
    Suppressed,
    /// The sink failed; nothing was written.
    Failed,
}

impl LogOutcome {
    /// Return the string representation of this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Suppressed => "suppressed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LogOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes deduplicated usage rows to a sink.
#[derive(Clone)]
pub struct UsageAuditLogger {
    sink: Arc<dyn UsageEventSink>,
    config: AuditConfig,
}

impl UsageAuditLogger {
    /// Create a logger over `sink`.
    pub fn new(sink: Arc<dyn UsageEventSink>, config: AuditConfig) -> Self {
        Self { sink, config }
    }

    /// The configured throttle window.
    pub fn window(&self) -> Duration {
        let secs = i64::try_from(self.config.throttle_window_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs.min(MAX_WINDOW_SECS))
    }

    /// Record `entry` now, unless already recorded inside the configured
    /// window.
    pub fn log_once(&self, entry: AccessLogEntry) -> LogOutcome {
        self.log_once_at(entry, Utc::now(), self.window())
    }

    /// Record `entry` at `now`, unless a row for the same key exists at or
    /// after `now - window`.
    pub fn log_once_at(
        &self,
        entry: AccessLogEntry,
        now: DateTime<Utc>,
        window: Duration,
    ) -> LogOutcome {
        let window_start = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        match self.sink.has_event_since(
            entry.principal_id,
            entry.content_item_id,
            &entry.surface,
            window_start,
        ) {
            Ok(true) => return LogOutcome::Suppressed,
            Ok(false) => {}
            Err(err) => return self.failed("lookup", &entry, &err),
        }

        let event = UsageEvent {
            id: Uuid::new_v4(),
            principal_id: entry.principal_id,
            institution_id: entry.institution_id,
            content_item_id: entry.content_item_id,
            allowed: entry.allowed,
            reason: entry.reason.clone(),
            surface: entry.surface.clone(),
            ip_address: bounded(entry.ip_address.as_deref(), self.config.max_ip_len),
            user_agent: bounded(entry.user_agent.as_deref(), self.config.max_user_agent_len),
            occurred_at: now,
        };
        match self.sink.insert(event) {
            Ok(()) => LogOutcome::Inserted,
            Err(err) => self.failed("insert", &entry, &err),
        }
    }

    fn failed(&self, stage: &'static str, entry: &AccessLogEntry, err: &StoreError) -> LogOutcome {
        tracing::warn!(
            stage,
            principal_id = %entry.principal_id,
            content_item_id = %entry.content_item_id,
            surface = %entry.surface,
            error = %err,
            "usage audit failed"
        );
        metrics::counter!(AUDIT_FAILURE_COUNTER, "stage" => stage).increment(1);
        LogOutcome::Failed
    }
}

impl std::fmt::Debug for UsageAuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageAuditLogger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Truncate to at most `max_chars` characters, never splitting a character.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

fn bounded(value: Option<&str>, max_chars: usize) -> String {
    value
        .map(|v| truncate_chars(v.trim(), max_chars).to_string())
        .unwrap_or_default()
}
