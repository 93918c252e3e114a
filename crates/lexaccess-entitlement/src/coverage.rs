//! # Institution Coverage Guard
//!
//! Decides whether an institution's subscriptions currently cover a set of
//! products, and when they do not, whether the institution has a stake it
//! is failing to honour (a lock) or simply has nothing to offer (a plain
//! deny).
//!
//! The distinction matters downstream: a lock becomes a hard block with a
//! "contact your administrator" message, a plain deny lets the evaluator
//! look for other grants.
//!
//! ## Classification
//!
//! 1. Unassigned institution id: deny [`CoverageReason::NoInstitution`].
//! 2. No products: deny [`CoverageReason::NoProducts`].
//! 3. Institution missing or inactive: deny
//!    [`CoverageReason::InstitutionInactive`].
//! 4. No subscription row for any product: deny
//!    [`CoverageReason::NoSubscriptionRow`].
//! 5. Any active row with `start <= now <= end`: allow.
//! 6. Otherwise lock, first match of: any suspended row; any expired row or
//!    row ending before `now - grace_days`; any row not yet started or
//!    pending; anything else ([`CoverageReason::NotEntitled`]).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use lexaccess_core::{
    CoverageReason, EngineError, Institution, InstitutionId, InstitutionStore,
    InstitutionSubscription, ProductId, ReadBudget, SubscriptionStatus, SubscriptionStore,
};

/// Outcome of a coverage check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageDecision {
    /// Whether the institution currently covers the products.
    pub allowed: bool,
    /// The institution holds a stake but is not honouring it.
    pub is_institution_lock: bool,
    /// Classification.
    pub reason: CoverageReason,
    /// Human-readable explanation.
    pub message: String,
}

impl CoverageDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            is_institution_lock: false,
            reason: CoverageReason::Active,
            message: "Institution subscription is active.".into(),
        }
    }

    fn deny(reason: CoverageReason, message: &str) -> Self {
        Self {
            allowed: false,
            is_institution_lock: false,
            reason,
            message: message.into(),
        }
    }

    fn lock(reason: CoverageReason, message: &str) -> Self {
        Self {
            allowed: false,
            is_institution_lock: true,
            reason,
            message: message.into(),
        }
    }
}

/// Coverage classification with the institution row it was read from.
#[derive(Debug, Clone)]
pub(crate) struct CoverageAssessment {
    pub(crate) decision: CoverageDecision,
    pub(crate) institution: Option<Institution>,
}

/// Classifies institution coverage from the institution and subscription
/// stores.
pub struct InstitutionCoverageGuard<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for InstitutionCoverageGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for InstitutionCoverageGuard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstitutionCoverageGuard")
            .finish_non_exhaustive()
    }
}

impl<S> InstitutionCoverageGuard<S>
where
    S: ?Sized + InstitutionStore + SubscriptionStore,
{
    /// Create a guard over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Classify coverage of `product_ids` by `institution_id` at `now`.
    ///
    /// # Errors
    ///
    /// [`EngineError`] when a store read fails or the budget is spent.
    pub fn evaluate_coverage(
        &self,
        institution_id: InstitutionId,
        product_ids: &[ProductId],
        now: DateTime<Utc>,
        grace_days: u32,
        budget: &ReadBudget,
    ) -> Result<CoverageDecision, EngineError> {
        self.assess(institution_id, product_ids, now, grace_days, budget)
            .map(|a| a.decision)
    }

    pub(crate) fn assess(
        &self,
        institution_id: InstitutionId,
        product_ids: &[ProductId],
        now: DateTime<Utc>,
        grace_days: u32,
        budget: &ReadBudget,
    ) -> Result<CoverageAssessment, EngineError> {
        if !institution_id.is_assigned() {
            return Ok(unattached(CoverageDecision::deny(
                CoverageReason::NoInstitution,
                "No institution is attached to this account.",
            )));
        }
        if product_ids.is_empty() {
            return Ok(unattached(CoverageDecision::deny(
                CoverageReason::NoProducts,
                "The document is not assigned to any product.",
            )));
        }

        budget.check("institution lookup")?;
        let institution = match self.store.institution(institution_id)? {
            Some(inst) if inst.is_active => inst,
            _ => {
                return Ok(unattached(CoverageDecision::deny(
                    CoverageReason::InstitutionInactive,
                    "The institution is not active.",
                )));
            }
        };

        budget.check("institution subscription lookup")?;
        let rows = self
            .store
            .institution_subscriptions(institution_id, product_ids)?;

        let decision = classify(&rows, now, grace_days);
        tracing::debug!(
            %institution_id,
            rows = rows.len(),
            reason = decision.reason.as_str(),
            "institution coverage classified"
        );
        Ok(CoverageAssessment {
            decision,
            institution: Some(institution),
        })
    }
}

fn unattached(decision: CoverageDecision) -> CoverageAssessment {
    CoverageAssessment {
        decision,
        institution: None,
    }
}

fn classify(
    rows: &[InstitutionSubscription],
    now: DateTime<Utc>,
    grace_days: u32,
) -> CoverageDecision {
    if rows.is_empty() {
        return CoverageDecision::deny(
            CoverageReason::NoSubscriptionRow,
            "The institution does not subscribe to this content.",
        );
    }
    if rows.iter().any(|row| row.is_current(now)) {
        return CoverageDecision::allow();
    }

    let grace_end = now
        .checked_sub_signed(Duration::days(i64::from(grace_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    if rows
        .iter()
        .any(|row| row.status == SubscriptionStatus::Suspended)
    {
        CoverageDecision::lock(
            CoverageReason::Suspended,
            "Your institution's subscription is suspended. Contact your institution administrator.",
        )
    } else if rows
        .iter()
        .any(|row| row.status == SubscriptionStatus::Expired || row.end_date < grace_end)
    {
        CoverageDecision::lock(
            CoverageReason::Expired,
            "Your institution's subscription has expired. Contact your institution administrator.",
        )
    } else if rows
        .iter()
        .any(|row| row.start_date > now || row.status == SubscriptionStatus::Pending)
    {
        CoverageDecision::lock(
            CoverageReason::NotStarted,
            "Your institution's subscription has not started yet. \
             Contact your institution administrator.",
        )
    } else {
        CoverageDecision::lock(
            CoverageReason::NotEntitled,
            "Your institution's subscription does not cover this content right now. \
             Contact your institution administrator.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lexaccess_core::Snapshot;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 9, 30, 0).unwrap()
    }

    fn institution(active: bool) -> Institution {
        Institution {
            id: InstitutionId::new(10),
            name: "Riverside Law School".into(),
            is_active: active,
            seat_limits: Default::default(),
        }
    }

    fn row(
        status: SubscriptionStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> InstitutionSubscription {
        InstitutionSubscription {
            institution_id: InstitutionId::new(10),
            product_id: ProductId::new(200),
            status,
            start_date: start,
            end_date: end,
        }
    }

    fn guard(
        active: bool,
        rows: Vec<InstitutionSubscription>,
    ) -> InstitutionCoverageGuard<Snapshot> {
        InstitutionCoverageGuard::new(Arc::new(Snapshot {
            institutions: vec![institution(active)],
            institution_subscriptions: rows,
            ..Snapshot::default()
        }))
    }

    fn check(
        g: &InstitutionCoverageGuard<Snapshot>,
        at: DateTime<Utc>,
        grace: u32,
    ) -> CoverageDecision {
        g.evaluate_coverage(
            InstitutionId::new(10),
            &[ProductId::new(200)],
            at,
            grace,
            &ReadBudget::unbounded(),
        )
        .unwrap()
    }

    #[test]
    fn unassigned_institution_is_plain_deny() {
        let g = guard(true, vec![]);
        let d = g
            .evaluate_coverage(
                InstitutionId::new(0),
                &[ProductId::new(200)],
                now(),
                0,
                &ReadBudget::unbounded(),
            )
            .unwrap();
        assert_eq!(d.reason, CoverageReason::NoInstitution);
        assert!(!d.allowed && !d.is_institution_lock);
    }

    #[test]
    fn empty_products_is_plain_deny() {
        let g = guard(true, vec![]);
        let budget = ReadBudget::unbounded();
        let d = g
            .evaluate_coverage(InstitutionId::new(10), &[], now(), 0, &budget)
            .unwrap();
        assert_eq!(d.reason, CoverageReason::NoProducts);
        assert!(!d.is_institution_lock);
    }

    #[test]
    fn inactive_institution_is_not_a_lock() {
        let start = now() - Duration::days(30);
        let end = now() + Duration::days(30);
        let g = guard(false, vec![row(SubscriptionStatus::Active, start, end)]);
        let d = check(&g, now(), 0);
        assert_eq!(d.reason, CoverageReason::InstitutionInactive);
        assert!(!d.is_institution_lock);
    }

    #[test]
    fn missing_row_is_plain_deny() {
        let d = check(&guard(true, vec![]), now(), 0);
        assert_eq!(d.reason, CoverageReason::NoSubscriptionRow);
        assert!(!d.is_institution_lock);
    }

    #[test]
    fn end_boundary_is_inclusive() {
        let start = now() - Duration::days(365);
        let end = now();
        let g = guard(true, vec![row(SubscriptionStatus::Active, start, end)]);
        let at_end = check(&g, end, 0);
        assert!(at_end.allowed);
        assert_eq!(at_end.reason, CoverageReason::Active);

        let after = check(&g, end + Duration::seconds(1), 0);
        assert!(!after.allowed);
        assert!(after.is_institution_lock);
        assert_eq!(after.reason, CoverageReason::Expired);
    }

    #[test]
    fn suspended_beats_expired() {
        let start = now() - Duration::days(400);
        let month = Duration::days(30);
        let expired = row(SubscriptionStatus::Expired, start, now() - month);
        let suspended = row(SubscriptionStatus::Suspended, start, now() + month);
        let g = guard(true, vec![expired, suspended]);
        assert_eq!(check(&g, now(), 0).reason, CoverageReason::Suspended);
    }

    #[test]
    fn future_and_pending_rows_are_not_started() {
        let soon = now() + Duration::days(1);
        let year = Duration::days(365);
        let not_yet = row(SubscriptionStatus::Active, soon, soon + year);
        let g = guard(true, vec![not_yet]);
        assert_eq!(check(&g, now(), 0).reason, CoverageReason::NotStarted);

        let yesterday = now() - Duration::days(1);
        let pending = row(SubscriptionStatus::Pending, yesterday, soon);
        let g = guard(true, vec![pending]);
        let d = check(&g, now(), 0);
        assert_eq!(d.reason, CoverageReason::NotStarted);
        assert!(d.is_institution_lock);
    }

    #[test]
    fn grace_period_defers_expiry_classification() {
        let start = now() - Duration::days(365);
        let ended = now() - Duration::days(2);
        let g = guard(true, vec![row(SubscriptionStatus::Active, start, ended)]);
        assert_eq!(check(&g, now(), 0).reason, CoverageReason::Expired);
        let within_grace = check(&g, now(), 7);
        assert!(!within_grace.allowed);
        assert!(within_grace.is_institution_lock);
        assert_eq!(within_grace.reason, CoverageReason::NotEntitled);
    }

    #[test]
    fn spent_budget_is_an_error() {
        let g = guard(true, vec![]);
        let flag = lexaccess_core::CancellationFlag::new();
        flag.cancel();
        let budget = ReadBudget::unbounded().cancellable(flag);
        let products = [ProductId::new(200)];
        let err = g
            .evaluate_coverage(InstitutionId::new(10), &products, now(), 0, &budget)
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled { .. }));
    }
}
