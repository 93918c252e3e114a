//! # Access Policy Evaluator
//!
//! Decides full access versus preview for a (principal, content item) pair.
//! Policy layers are checked in a fixed order and the first that decides
//! wins:
//!
//! 1. Global administrator: full access.
//! 2. Free content: full access, anonymous visitors included.
//! 3. Anonymous visitor: preview, sign in first.
//! 4. Premium item with no product: preview, nothing to buy.
//! 5. Ownership of any mapped product: full access.
//! 6. Principal attached to an institution:
//!    - coverage locked, or the institution inactive while holding rows for
//!      the products: hard block
//!      ([`DenyReason::InstitutionSubscriptionInactive`]), whatever the
//!      state of the principal's membership;
//!    - coverage allowed, membership approved and active, seat held: full
//!      access;
//!    - coverage allowed, membership in good standing, no seat: hard block
//!      ([`DenyReason::InstitutionSeatLimitExceeded`]);
//!    - otherwise continue.
//! 7. Current personal subscription or trial grant: full access.
//! 8. Preview with [`DenyReason::NotEntitled`], plus a priced purchase offer
//!    when a mapped product is sold individually.
//!
//! Ownership is a permanent purchase and is honoured even when the
//! principal's institution is locked. Personal subscriptions and trials are
//! time-limited and do not bypass an institution lock.
//!
//! The evaluator never writes. Every store read is preceded by a
//! [`ReadBudget`] check; a spent budget or a failed read surfaces as
//! [`EngineError`] and never as a decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use lexaccess_core::{
    AccessConfig, ContentItem, ContentProduct, CoverageReason, DenyReason, EngineError,
    EntitlementStore, Membership, Principal, ReadBudget,
};
use lexaccess_tax::{TaxCalculator, TaxRuleResolver};

use crate::coverage::InstitutionCoverageGuard;
use crate::decision::{Decision, PurchaseOffer};
use crate::seats::allocate_seat;

const SIGN_IN_MESSAGE: &str = "Sign in to read the full document.";
const NOT_ENTITLED_MESSAGE: &str =
    "Your account does not include this document. A preview is available.";

/// Evaluates access to content items.
///
/// Cheap to clone: all state is behind `Arc`s.
#[derive(Clone)]
pub struct AccessPolicyEvaluator {
    store: Arc<dyn EntitlementStore>,
    coverage: InstitutionCoverageGuard<dyn EntitlementStore>,
    tax: TaxRuleResolver,
    config: AccessConfig,
}

impl AccessPolicyEvaluator {
    /// Create an evaluator over `store`, pricing offers with `tax`.
    pub fn new(
        store: Arc<dyn EntitlementStore>,
        tax: TaxRuleResolver,
        config: AccessConfig,
    ) -> Self {
        let coverage = InstitutionCoverageGuard::new(Arc::clone(&store));
        Self {
            store,
            coverage,
            tax,
            config,
        }
    }

    /// The coverage guard this evaluator consults.
    pub fn coverage_guard(&self) -> &InstitutionCoverageGuard<dyn EntitlementStore> {
        &self.coverage
    }

    /// The VAT resolver used to price offers.
    pub fn tax_resolver(&self) -> &TaxRuleResolver {
        &self.tax
    }

    /// Evaluate access now, without a read budget.
    ///
    /// # Errors
    ///
    /// [`EngineError::Store`] when a store read fails.
    pub fn evaluate_access(
        &self,
        principal: Option<&Principal>,
        item: &ContentItem,
    ) -> Result<Decision, EngineError> {
        self.evaluate_access_at(principal, item, Utc::now(), &ReadBudget::unbounded())
    }

    /// Evaluate access at `now` under `budget`.
    ///
    /// # Errors
    ///
    /// [`EngineError`] when a store read fails or the budget is spent.
    pub fn evaluate_access_at(
        &self,
        principal: Option<&Principal>,
        item: &ContentItem,
        now: DateTime<Utc>,
        budget: &ReadBudget,
    ) -> Result<Decision, EngineError> {
        if principal.is_some_and(|p| p.is_global_admin) {
            let decision = Decision::granted("Administrator access.");
            return Ok(decided(item, "global_admin", decision));
        }
        if !item.is_premium {
            return Ok(decided(item, "free_content", Decision::granted("Free content.")));
        }
        let Some(principal) = principal else {
            let decision = Decision::sign_in_required(SIGN_IN_MESSAGE);
            return Ok(decided(item, "anonymous", decision));
        };
        if item.product_ids.is_empty() {
            let decision = Decision::denied(DenyReason::NotEntitled, NOT_ENTITLED_MESSAGE)
                .with_purchase_disabled("This document is not assigned to any product.");
            return Ok(decided(item, "no_products", decision));
        }

        budget.check("ownership lookup")?;
        if self.store.owns_any(principal.id, &item.product_ids)? {
            let decision = Decision::granted("You own this document.");
            return Ok(decided(item, "ownership", decision));
        }

        if let Some(decision) = self.institution_decision(principal, item, now, budget)? {
            return Ok(decided(item, "institution", decision));
        }

        budget.check("personal subscription lookup")?;
        let grant = self
            .store
            .personal_subscriptions(principal.id, &item.product_ids)?
            .into_iter()
            .find(|s| s.is_current(now));
        if let Some(grant) = grant {
            let message = if grant.is_trial {
                "Trial access."
            } else {
                "Subscription access."
            };
            let decision = Decision::granted(message);
            return Ok(decided(item, "personal_subscription", decision));
        }

        let decision = self.purchase_decision(item, now, budget)?;
        Ok(decided(item, "not_entitled", decision))
    }

    /// Step 6. `None` means the institution has no say and evaluation
    /// continues.
    fn institution_decision(
        &self,
        principal: &Principal,
        item: &ContentItem,
        now: DateTime<Utc>,
        budget: &ReadBudget,
    ) -> Result<Option<Decision>, EngineError> {
        let Some(institution_id) = principal.institution_id.filter(|id| id.is_assigned()) else {
            return Ok(None);
        };

        let assessment = self.coverage.assess(
            institution_id,
            &item.product_ids,
            now,
            self.config.coverage_grace_days,
            budget,
        )?;
        let coverage = assessment.decision;

        if coverage.is_institution_lock {
            return Ok(Some(Decision::denied(
                DenyReason::InstitutionSubscriptionInactive,
                coverage.message,
            )));
        }

        if coverage.reason == CoverageReason::InstitutionInactive {
            budget.check("institution subscription lookup")?;
            let rows = self
                .store
                .institution_subscriptions(institution_id, &item.product_ids)?;
            if !rows.is_empty() {
                return Ok(Some(Decision::denied(
                    DenyReason::InstitutionSubscriptionInactive,
                    "Your institution's access is inactive. \
                     Contact your institution administrator.",
                )));
            }
            return Ok(None);
        }

        if !coverage.allowed {
            return Ok(None);
        }

        budget.check("membership lookup")?;
        let membership: Option<Membership> = self
            .store
            .membership(principal.id, institution_id)?
            .filter(Membership::is_in_good_standing);
        let Some(membership) = membership else {
            tracing::debug!(
                %institution_id,
                principal_id = %principal.id,
                "institution covers the item but membership is not in good standing"
            );
            return Ok(None);
        };

        if self.config.enforce_seat_limits {
            if let Some(institution) = assessment.institution.as_ref() {
                let seat = allocate_seat(&*self.store, institution, &membership, budget)?;
                if !seat.has_seat() {
                    tracing::debug!(
                        %institution_id,
                        principal_id = %principal.id,
                        member_type = %seat.member_type,
                        limit = seat.limit,
                        "institution seat limit reached"
                    );
                    return Ok(Some(Decision::denied(
                        DenyReason::InstitutionSeatLimitExceeded,
                        "Your institution has used all its seats for your membership type. \
                         Contact your institution administrator.",
                    )));
                }
            }
        }
        Ok(Some(Decision::granted("Institution subscription access.")))
    }

    /// Step 8: preview, with a priced offer when one exists.
    fn purchase_decision(
        &self,
        item: &ContentItem,
        now: DateTime<Utc>,
        budget: &ReadBudget,
    ) -> Result<Decision, EngineError> {
        let decision = Decision::denied(DenyReason::NotEntitled, NOT_ENTITLED_MESSAGE);

        budget.check("product lookup")?;
        let products = self.store.products(&item.product_ids)?;
        let Some((product, price)) = products.iter().find_map(purchasable) else {
            return Ok(decision.with_purchase_disabled(
                "This document is not available for individual purchase.",
            ));
        };

        let resolution = self.tax.resolve_within(
            &self.config.purchase_purpose,
            item.country_code.as_deref(),
            product.vat_rate_id,
            now,
            budget,
        )?;
        match TaxCalculator::from_net(price, resolution.rate.as_ref()) {
            Ok(quote) => Ok(decision.with_offer(PurchaseOffer {
                product_id: product.id,
                product_name: product.name.clone(),
                currency: self.config.currency.clone(),
                quote,
                vat_source: resolution.source,
            })),
            Err(err) => {
                tracing::warn!(
                    product_id = %product.id,
                    error = %err,
                    "cannot price individual purchase"
                );
                Ok(decision.with_purchase_disabled("The price of this document is unavailable."))
            }
        }
    }
}

impl std::fmt::Debug for AccessPolicyEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicyEvaluator")
            .field("tax", &self.tax)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn purchasable(product: &ContentProduct) -> Option<(&ContentProduct, Decimal)> {
    if !product.is_active || !product.allows_individual_purchase {
        return None;
    }
    product
        .individual_price
        .filter(|price| price > &Decimal::ZERO)
        .map(|price| (product, price))
}

fn decided(item: &ContentItem, step: &'static str, decision: Decision) -> Decision {
    tracing::debug!(
        item_id = %item.id,
        step,
        access_level = ?decision.access_level(),
        deny_reason = decision.deny_reason().as_str(),
        "access decided"
    );
    decision
}
