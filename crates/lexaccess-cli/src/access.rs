//! # Access Subcommand
//!
//! Evaluates whether a principal reads a document in full or only its
//! preview, using the snapshot as the entitlement and VAT store.
//!
//! With `--surface`, the outcome is also passed through the usage audit
//! logger and the audit result is reported. The log is in memory and lives
//! only for one invocation, so throttling never shows here: every run
//! reports `inserted`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use lexaccess_audit::{AccessLogEntry, InMemoryUsageLog, LogOutcome, UsageAuditLogger};
use lexaccess_core::{
    ContentItemId, EngineConfig, EntitlementStore, PrincipalDirectory, PrincipalId,
};
use lexaccess_entitlement::{AccessPolicyEvaluator, CallerAction, Decision};
use lexaccess_tax::TaxRuleResolver;

use crate::context::{load_snapshot, print_json, read_budget, resolve_instant};

/// Arguments for the `lexaccess access` subcommand.
#[derive(Args, Debug)]
pub struct AccessArgs {
    /// Path to the state snapshot (YAML, or JSON by extension).
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Content item to evaluate.
    #[arg(long, value_name = "ID")]
    pub item: ContentItemId,

    /// Requesting principal. Omit for an anonymous visitor.
    #[arg(long, value_name = "ID")]
    pub principal: Option<PrincipalId>,

    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<String>,

    /// Abort when the store reads take longer than this.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Pass the outcome through the usage audit logger for this surface.
    ///
    /// The log is in-memory and discarded on exit, so the result is always
    /// `inserted`; repeated runs are not throttled.
    #[arg(long)]
    pub surface: Option<String>,
}

/// What `lexaccess access` prints.
#[derive(Debug, Serialize)]
pub struct AccessReport {
    /// Evaluated document.
    pub content_item_id: ContentItemId,
    /// Requesting principal, `None` for anonymous.
    pub principal_id: Option<PrincipalId>,
    /// Instant the decision was made for.
    pub evaluated_at: DateTime<Utc>,
    /// The caller's next step.
    pub caller_action: CallerAction,
    /// Full decision.
    pub decision: Decision,
    /// Usage audit result, when `--surface` was given for a signed-in principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<LogOutcome>,
}

/// Execute the access subcommand.
///
/// Returns exit code 0; engine failures are errors.
pub fn run_access(args: &AccessArgs, config: &EngineConfig) -> Result<u8> {
    let report = evaluate(args, config)?;
    print_json(&report)?;
    Ok(0)
}

/// Evaluate access for `args` without printing.
pub fn evaluate(args: &AccessArgs, config: &EngineConfig) -> Result<AccessReport> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let now = resolve_instant(args.at.as_deref())?;

    let item = snapshot
        .content_item(args.item)
        .cloned()
        .with_context(|| format!("content item {} not found in snapshot", args.item))?;
    let principal = match args.principal {
        Some(id) => Some(
            snapshot
                .principal(id)?
                .with_context(|| format!("principal {id} not found in snapshot"))?,
        ),
        None => None,
    };

    let store: Arc<dyn EntitlementStore> = snapshot.clone();
    let tax = TaxRuleResolver::new(snapshot, config.tax.clone());
    let evaluator = AccessPolicyEvaluator::new(store, tax, config.access.clone());

    let budget = read_budget(args.timeout_ms);
    let decision = evaluator
        .evaluate_access_at(principal.as_ref(), &item, now, &budget)
        .with_context(|| format!("could not evaluate access to item {}", item.id))?;

    let audit = match (args.surface.as_deref(), principal.as_ref()) {
        (Some(surface), Some(principal)) => {
            let logger =
                UsageAuditLogger::new(Arc::new(InMemoryUsageLog::new()), config.audit.clone());
            let entry =
                AccessLogEntry::from_outcome(principal, item.id, surface, decision.deny_reason());
            Some(logger.log_once_at(entry, now, logger.window()))
        }
        _ => None,
    };

    Ok(AccessReport {
        content_item_id: item.id,
        principal_id: principal.as_ref().map(|p| p.id),
        evaluated_at: now,
        caller_action: decision.caller_action(),
        decision,
        audit,
    })
}
