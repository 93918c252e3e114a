//! Library fixture shared by the integration suites.
//!
//! One institution (10, active, subscribed to product 200 for 2026), one
//! individually purchasable product, one premium document sold in Kenya, and
//! the Kenyan VAT table.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use lexaccess_core::{
    AccessConfig, ContentItem, ContentItemId, ContentProduct, EffectiveWindow, EntitlementStore,
    Institution, InstitutionId, InstitutionSubscription, MemberType, Membership, MembershipStatus,
    Ownership, PersonalSubscription, Principal, PrincipalId, ProductId, Snapshot,
    SubscriptionStatus, TaxConfig, VatRate, VatRateId, VatRule, VatRuleId,
};
use lexaccess_entitlement::AccessPolicyEvaluator;
use lexaccess_tax::TaxRuleResolver;

pub const INSTITUTION: InstitutionId = InstitutionId::new(10);
pub const PRODUCT: ProductId = ProductId::new(200);
pub const ITEM: ContentItemId = ContentItemId::new(5000);

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn now() -> DateTime<Utc> {
    at(2026, 6, 15, 9, 0, 0)
}

pub fn subscription_end() -> DateTime<Utc> {
    at(2026, 12, 31, 23, 59, 59)
}

pub fn user(id: i64, institution: Option<InstitutionId>) -> Principal {
    Principal {
        id: PrincipalId::new(id),
        approved: true,
        is_global_admin: false,
        role: "User".into(),
        institution_id: institution,
    }
}

pub fn admin(id: i64) -> Principal {
    Principal {
        is_global_admin: true,
        role: "Admin".into(),
        ..user(id, None)
    }
}

pub fn member(
    principal: &Principal,
    member_type: MemberType,
    approved_at: Option<DateTime<Utc>>,
) -> Membership {
    Membership {
        principal_id: principal.id,
        institution_id: INSTITUTION,
        member_type,
        status: MembershipStatus::Approved,
        is_active: true,
        approved_at,
    }
}

pub fn institution_subscription(status: SubscriptionStatus) -> InstitutionSubscription {
    InstitutionSubscription {
        institution_id: INSTITUTION,
        product_id: PRODUCT,
        status,
        start_date: at(2026, 1, 1, 0, 0, 0),
        end_date: subscription_end(),
    }
}

pub fn trial(principal: &Principal) -> PersonalSubscription {
    PersonalSubscription {
        principal_id: principal.id,
        product_id: PRODUCT,
        status: SubscriptionStatus::Active,
        start_date: at(2026, 6, 1, 0, 0, 0),
        end_date: at(2026, 6, 30, 23, 59, 59),
        is_trial: true,
    }
}

pub fn ownership(principal: &Principal) -> Ownership {
    Ownership {
        principal_id: principal.id,
        product_id: PRODUCT,
        acquired_at: Some(at(2025, 3, 2, 10, 0, 0)),
    }
}

pub fn premium_item() -> ContentItem {
    ContentItem {
        id: ITEM,
        title: "Civil Appeal 12 of 2024".into(),
        is_premium: true,
        product_ids: vec![PRODUCT],
        country_code: Some("KE".into()),
    }
}

pub fn vat_rate(id: i64, code: &str, percent: i64) -> VatRate {
    VatRate {
        id: VatRateId::new(id),
        code: code.into(),
        name: code.into(),
        rate_percent: Decimal::from(percent),
        country_code: Some("KE".into()),
        is_active: true,
        window: EffectiveWindow::open(),
    }
}

pub fn vat_rule(
    id: i64,
    purpose: &str,
    country: Option<&str>,
    rate: i64,
    priority: i32,
) -> VatRule {
    VatRule {
        id: VatRuleId::new(id),
        purpose: purpose.into(),
        country_code: country.map(str::to_string),
        vat_rate_id: VatRateId::new(rate),
        priority,
        is_active: true,
        window: EffectiveWindow::open(),
    }
}

/// The baseline library with no principals or memberships.
pub fn library() -> Snapshot {
    Snapshot {
        institutions: vec![Institution {
            id: INSTITUTION,
            name: "Riverside Law School".into(),
            is_active: true,
            seat_limits: BTreeMap::new(),
        }],
        products: vec![ContentProduct {
            id: PRODUCT,
            name: "Court of Appeal Reports".into(),
            is_active: true,
            allows_individual_purchase: true,
            individual_price: Some(Decimal::new(25000, 2)),
            vat_rate_id: None,
        }],
        content_items: vec![premium_item()],
        institution_subscriptions: vec![institution_subscription(SubscriptionStatus::Active)],
        vat_rates: vec![vat_rate(1, "VAT16", 16), vat_rate(2, "VAT8", 8)],
        vat_rules: vec![vat_rule(1, "PublicLegalDocumentPurchase", Some("KE"), 1, 10)],
        ..Snapshot::default()
    }
}

pub fn evaluator(snapshot: Snapshot) -> AccessPolicyEvaluator {
    evaluator_with(snapshot, AccessConfig::default())
}

pub fn evaluator_with(snapshot: Snapshot, config: AccessConfig) -> AccessPolicyEvaluator {
    let snapshot = Arc::new(snapshot);
    let store: Arc<dyn EntitlementStore> = snapshot.clone();
    let tax = TaxRuleResolver::new(snapshot, TaxConfig::default());
    AccessPolicyEvaluator::new(store, tax, config)
}
