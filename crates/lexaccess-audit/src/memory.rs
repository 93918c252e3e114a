//! In-memory [`UsageEventSink`].
//!
//! Backs the test suites and single-process deployments that ship rows
//! elsewhere on their own schedule. Rows live in insertion order behind a
//! `parking_lot` mutex; the lock is never held across a sink call.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use lexaccess_core::{ContentItemId, PrincipalId, StoreError, UsageEvent, UsageEventSink};

/// Append-only usage rows kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryUsageLog {
    events: Mutex<Vec<UsageEvent>>,
}

impl InMemoryUsageLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every row, oldest first.
    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().clone()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no row was written.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl UsageEventSink for InMemoryUsageLog {
    fn has_event_since(
        &self,
        principal_id: PrincipalId,
        content_item_id: ContentItemId,
        surface: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.events.lock().iter().any(|e| {
            e.principal_id == principal_id
                && e.content_item_id == content_item_id
                && e.surface == surface
                && e.occurred_at >= since
        }))
    }

    fn insert(&self, event: UsageEvent) -> Result<(), StoreError> {
        self.events.lock().push(event);
        Ok(())
    }
}
