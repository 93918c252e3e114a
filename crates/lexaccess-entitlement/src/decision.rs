//! # Access Decisions
//!
//! [`Decision`] is the value the evaluator returns. Its fields are private
//! and it can only be built through [`Decision::granted`],
//! [`Decision::denied`], and [`Decision::sign_in_required`], which keeps two
//! invariants by construction:
//!
//! - `deny_reason` is `None` exactly when `access_level` is `FullAccess`.
//! - A hard block never carries a purchase offer.

use serde::{Deserialize, Serialize};

use lexaccess_core::{AccessLevel, DenyReason, ProductId};
use lexaccess_tax::{TaxQuote, VatSource};

/// A priced offer to buy one product outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOffer {
    /// Product on offer.
    pub product_id: ProductId,
    /// Product display name.
    pub product_name: String,
    /// ISO 4217 currency of the quote.
    pub currency: String,
    /// VAT-inclusive price.
    pub quote: TaxQuote,
    /// Where the VAT rate came from.
    pub vat_source: VatSource,
}

/// What a caller should do with a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerAction {
    /// Serve the full document.
    Granted,
    /// Stop the flow and tell the user to contact their administrator.
    Blocked,
    /// Show the preview and the purchase offer.
    PurchaseOffer,
    /// Show the preview and ask the user to sign in.
    SignInRequired,
    /// Show the preview with the purchase-disabled explanation.
    Unavailable,
}

impl CallerAction {
    /// Return the string representation of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Blocked => "blocked",
            Self::PurchaseOffer => "purchase_offer",
            Self::SignInRequired => "sign_in_required",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for CallerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an access evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    access_level: AccessLevel,
    deny_reason: DenyReason,
    message: String,
    can_purchase_individually: bool,
    purchase_disabled_reason: Option<String>,
    hard_block: bool,
    offer: Option<PurchaseOffer>,
    #[serde(skip)]
    sign_in_required: bool,
}

impl Decision {
    /// Full access.
    pub fn granted(message: impl Into<String>) -> Self {
        Self {
            access_level: AccessLevel::FullAccess,
            deny_reason: DenyReason::None,
            message: message.into(),
            can_purchase_individually: false,
            purchase_disabled_reason: None,
            hard_block: false,
            offer: None,
            sign_in_required: false,
        }
    }

    /// Preview only. Institution reasons become hard blocks.
    ///
    /// [`DenyReason::None`] cannot describe a denial and is recorded as
    /// [`DenyReason::NotEntitled`].
    pub fn denied(reason: DenyReason, message: impl Into<String>) -> Self {
        let reason = match reason {
            DenyReason::None => DenyReason::NotEntitled,
            other => other,
        };
        Self {
            access_level: AccessLevel::PreviewOnly,
            deny_reason: reason,
            message: message.into(),
            can_purchase_individually: false,
            purchase_disabled_reason: None,
            hard_block: reason.is_institution_block(),
            offer: None,
            sign_in_required: false,
        }
    }

    /// Preview only for an anonymous visitor.
    pub fn sign_in_required(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut decision = Self::denied(DenyReason::NotEntitled, message.clone());
        decision.purchase_disabled_reason = Some(message);
        decision.sign_in_required = true;
        decision
    }

    /// Attach a purchase offer. Ignored on granted decisions and hard blocks.
    pub fn with_offer(mut self, offer: PurchaseOffer) -> Self {
        if self.accepts_purchase_details() {
            self.can_purchase_individually = true;
            self.purchase_disabled_reason = None;
            self.offer = Some(offer);
        }
        self
    }

    /// Explain why purchase is not offered. Ignored on granted decisions and
    /// hard blocks.
    pub fn with_purchase_disabled(mut self, reason: impl Into<String>) -> Self {
        if self.accepts_purchase_details() {
            self.can_purchase_individually = false;
            self.offer = None;
            self.purchase_disabled_reason = Some(reason.into());
        }
        self
    }

    fn accepts_purchase_details(&self) -> bool {
        self.access_level == AccessLevel::PreviewOnly && !self.hard_block
    }

    /// Full access or preview.
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Why access is not full. [`DenyReason::None`] when granted.
    pub fn deny_reason(&self) -> DenyReason {
        self.deny_reason
    }

    /// Human-readable explanation.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether individual purchase is offered.
    pub fn can_purchase_individually(&self) -> bool {
        self.can_purchase_individually
    }

    /// Why individual purchase is not offered, when it is not.
    pub fn purchase_disabled_reason(&self) -> Option<&str> {
        self.purchase_disabled_reason.as_deref()
    }

    /// Whether the UI flow must stop.
    pub fn is_hard_block(&self) -> bool {
        self.hard_block
    }

    /// The purchase offer, if any.
    pub fn offer(&self) -> Option<&PurchaseOffer> {
        self.offer.as_ref()
    }

    /// Whether the principal gets the full document.
    pub fn is_granted(&self) -> bool {
        self.access_level == AccessLevel::FullAccess
    }

    /// Map the decision to the caller's next step.
    pub fn caller_action(&self) -> CallerAction {
        if self.is_granted() {
            CallerAction::Granted
        } else if self.hard_block {
            CallerAction::Blocked
        } else if self.sign_in_required {
            CallerAction::SignInRequired
        } else if self.can_purchase_individually {
            CallerAction::PurchaseOffer
        } else {
            CallerAction::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn offer() -> PurchaseOffer {
        PurchaseOffer {
            product_id: ProductId::new(200),
            product_name: "Court of Appeal Reports".into(),
            currency: "KES".into(),
            quote: TaxQuote {
                vat_code: Some("VAT16".into()),
                vat_rate_percent: Decimal::new(16, 0),
                net_amount: Decimal::new(100, 0),
                vat_amount: Decimal::new(1600, 2),
                gross_amount: Decimal::new(11600, 2),
            },
            vat_source: VatSource::ExplicitRate,
        }
    }

    #[test]
    fn granted_has_no_deny_reason() {
        let d = Decision::granted("ok");
        assert_eq!(d.access_level(), AccessLevel::FullAccess);
        assert_eq!(d.deny_reason(), DenyReason::None);
        assert_eq!(d.caller_action(), CallerAction::Granted);
    }

    #[test]
    fn denied_never_carries_none_reason() {
        let d = Decision::denied(DenyReason::None, "no");
        assert_eq!(d.deny_reason(), DenyReason::NotEntitled);
        assert_eq!(d.access_level(), AccessLevel::PreviewOnly);
    }

    #[test]
    fn hard_block_refuses_offer() {
        let d = Decision::denied(DenyReason::InstitutionSeatLimitExceeded, "full")
            .with_offer(offer())
            .with_purchase_disabled("x");
        assert!(d.is_hard_block());
        assert!(!d.can_purchase_individually());
        assert!(d.offer().is_none());
        assert!(d.purchase_disabled_reason().is_none());
        assert_eq!(d.caller_action(), CallerAction::Blocked);
    }

    #[test]
    fn soft_deny_accepts_offer() {
        let d = Decision::denied(DenyReason::NotEntitled, "buy it").with_offer(offer());
        assert!(d.can_purchase_individually());
        assert_eq!(d.caller_action(), CallerAction::PurchaseOffer);
    }

    #[test]
    fn granted_ignores_offer() {
        let d = Decision::granted("ok").with_offer(offer());
        assert!(!d.can_purchase_individually());
    }

    #[test]
    fn sign_in_and_unavailable_actions() {
        let d = Decision::sign_in_required("Sign in first.");
        assert_eq!(d.caller_action(), CallerAction::SignInRequired);
        assert_eq!(d.purchase_disabled_reason(), Some("Sign in first."));

        let d = Decision::denied(DenyReason::NotEntitled, "no").with_purchase_disabled("none");
        assert_eq!(d.caller_action(), CallerAction::Unavailable);
    }

    #[test]
    fn serializes_wire_field_names() {
        let json = serde_json::to_value(Decision::denied(
            DenyReason::InstitutionSubscriptionInactive,
            "locked",
        ))
        .unwrap();
        assert_eq!(json["access_level"], "PreviewOnly");
        assert_eq!(json["deny_reason"], "InstitutionSubscriptionInactive");
        assert_eq!(json["hard_block"], true);
        assert!(json.get("sign_in_required").is_none());
    }
}
