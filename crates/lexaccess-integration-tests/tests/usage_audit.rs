//! # Usage Audit Integration Tests
//!
//! Access decisions flowing into [`UsageAuditLogger`]: throttling per
//! (principal, item, surface), the recorded reason, and failure isolation.

mod common;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use lexaccess_audit::{AccessLogEntry, InMemoryUsageLog, LogOutcome, UsageAuditLogger};
use lexaccess_core::{
    AuditConfig, ContentItemId, DenyReason, PrincipalId, ReadBudget, StoreError, UsageEvent,
    UsageEventSink,
};

use common::*;

fn logger() -> (Arc<InMemoryUsageLog>, UsageAuditLogger) {
    let log = Arc::new(InMemoryUsageLog::new());
    let logger = UsageAuditLogger::new(log.clone(), AuditConfig::default());
    (log, logger)
}

#[test]
fn evaluated_outcome_is_recorded_once_per_window() {
    let reader = user(2, None);
    let budget = ReadBudget::unbounded();
    let decision = evaluator(library())
        .evaluate_access_at(Some(&reader), &premium_item(), now(), &budget)
        .unwrap();
    let (log, logger) = logger();
    let window = logger.window();

    let entry = || AccessLogEntry::from_outcome(&reader, ITEM, "reader", decision.deny_reason());
    assert_eq!(
        logger.log_once_at(entry(), now(), window),
        LogOutcome::Inserted
    );
    let soon = now() + Duration::seconds(60);
    assert_eq!(
        logger.log_once_at(entry(), soon, window),
        LogOutcome::Suppressed
    );
    let later = now() + window + Duration::seconds(1);
    assert_eq!(
        logger.log_once_at(entry(), later, window),
        LogOutcome::Inserted
    );

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| !e.allowed && e.reason == "NotEntitled"));
    assert!(events[0].occurred_at < events[1].occurred_at);
}

#[test]
fn institution_block_records_its_reason() {
    let student = user(1, Some(INSTITUTION));
    let (log, logger) = logger();
    let entry = AccessLogEntry::from_outcome(
        &student,
        ITEM,
        "download",
        DenyReason::InstitutionSeatLimitExceeded,
    );
    logger.log_once_at(entry, now(), logger.window());
    let event = &log.events()[0];
    assert_eq!(event.reason, "InstitutionSeatLimitExceeded");
    assert_eq!(event.institution_id, Some(INSTITUTION));
    assert_eq!(event.surface, "download");
}

#[test]
fn different_principals_are_not_throttled_together() {
    let (log, logger) = logger();
    for id in 1..=3 {
        let entry = AccessLogEntry::from_outcome(&user(id, None), ITEM, "reader", DenyReason::None);
        assert_eq!(
            logger.log_once_at(entry, now(), logger.window()),
            LogOutcome::Inserted
        );
    }
    assert_eq!(log.len(), 3);
}

#[test]
fn zero_window_never_suppresses_later_events() {
    let (log, logger) = logger();
    let entry = || AccessLogEntry::from_outcome(&user(1, None), ITEM, "reader", DenyReason::None);
    logger.log_once_at(entry(), now(), Duration::zero());
    let next = now() + Duration::seconds(1);
    assert_eq!(
        logger.log_once_at(entry(), next, Duration::zero()),
        LogOutcome::Inserted
    );
    assert_eq!(log.len(), 2);
}

struct UnreachableSink;

impl UsageEventSink for UnreachableSink {
    fn has_event_since(
        &self,
        _principal_id: PrincipalId,
        _content_item_id: ContentItemId,
        _surface: &str,
        _since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable {
            store: "usage log",
            reason: "connection refused".into(),
        })
    }

    fn insert(&self, _event: UsageEvent) -> Result<(), StoreError> {
        Ok(())
    }
}

#[test]
fn unreachable_sink_does_not_affect_the_caller() {
    let logger = UsageAuditLogger::new(Arc::new(UnreachableSink), AuditConfig::default());
    let entry = AccessLogEntry::from_outcome(&user(1, None), ITEM, "reader", DenyReason::None);
    assert_eq!(logger.log_once(entry), LogOutcome::Failed);
}
