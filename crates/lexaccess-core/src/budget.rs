//! # Read Budgets
//!
//! Every decision operation reads externally-owned state and may block on
//! store latency. A [`ReadBudget`] bounds that: it is checked before each
//! store read, and once spent the operation returns an
//! [`EngineError`] instead of a decision. No store is written during a
//! decision, so aborting leaves nothing half-applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::EngineError;

/// Shared cancellation signal.
///
/// Clones observe the same flag. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an un-cancelled flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every holder of this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was signalled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Deadline and cancellation bounds for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct ReadBudget {
    deadline: Option<Instant>,
    cancellation: Option<CancellationFlag>,
}

impl ReadBudget {
    /// A budget that never runs out.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A budget that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancellation: None,
        }
    }

    /// A budget that expires at `deadline`.
    pub fn until(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancellation: None,
        }
    }

    /// Attach a cancellation flag.
    pub fn cancellable(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Fail if the budget is spent. `stage` names the read about to run.
    ///
    /// # Errors
    ///
    /// [`EngineError::Cancelled`] if the flag was raised, otherwise
    /// [`EngineError::DeadlineExceeded`] if the deadline has passed.
    pub fn check(&self, stage: &'static str) -> Result<(), EngineError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
        {
            return Err(EngineError::Cancelled { stage });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(EngineError::DeadlineExceeded { stage });
            }
        }
        Ok(())
    }
}
