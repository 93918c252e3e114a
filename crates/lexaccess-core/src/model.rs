//! # Data Model
//!
//! Read-only snapshots of the rows the engine consults. Administrative
//! collaborators own creation and mutation of every row here; the engine
//! only reads the latest committed state at call time.
//!
//! The single row the core writes is [`UsageEvent`], through the audit
//! logger's sink.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{ContentItemId, InstitutionId, PrincipalId, ProductId, VatRateId, VatRuleId};
use crate::temporal::EffectiveWindow;

/// Role label that, together with an active permission assignment, grants a
/// permission code. The label alone grants nothing else; global
/// administration is a separate explicit flag.
pub const ADMIN_ROLE: &str = "Admin";

/// Country code on a [`VatRule`] that matches every country.
pub const COUNTRY_WILDCARD: &str = "*";

// ---------------------------------------------------------------------------
// Principals and institutions
// ---------------------------------------------------------------------------

/// A user account requesting access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Store key.
    pub id: PrincipalId,
    /// Whether an administrator approved the account.
    #[serde(default)]
    pub approved: bool,
    /// Explicit global-administrator flag. Independent of [`Principal::role`].
    #[serde(default)]
    pub is_global_admin: bool,
    /// Free-form role label (e.g. "Admin", "User").
    #[serde(default)]
    pub role: String,
    /// Institution the principal is attached to, if any.
    #[serde(default)]
    pub institution_id: Option<InstitutionId>,
}

/// The kind of seat a member occupies in an institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    /// Institution administrator.
    Admin,
    /// Staff member.
    Staff,
    /// Student member.
    Student,
}

impl MemberType {
    /// Return the string representation of this member type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Student => "student",
        }
    }
}

impl std::fmt::Display for MemberType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval state of a membership request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Awaiting institution approval.
    Pending,
    /// Approved by the institution.
    Approved,
    /// Rejected by the institution.
    Rejected,
}

/// A subscribing organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    /// Store key.
    pub id: InstitutionId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Inactive institutions grant nothing.
    #[serde(default)]
    pub is_active: bool,
    /// Maximum seats per member type. A type absent from the map is unlimited.
    #[serde(default)]
    pub seat_limits: BTreeMap<MemberType, u32>,
}

impl Institution {
    /// The configured seat limit for a member type, if any.
    pub fn seat_limit(&self, member_type: MemberType) -> Option<u32> {
        self.seat_limits.get(&member_type).copied()
    }
}

/// A (principal, institution) membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The member.
    pub principal_id: PrincipalId,
    /// The institution.
    pub institution_id: InstitutionId,
    /// Seat kind.
    pub member_type: MemberType,
    /// Approval state.
    pub status: MembershipStatus,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_active: bool,
    /// When the membership was approved. Orders seat allocation.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl Membership {
    /// Approved and active.
    pub fn is_in_good_standing(&self) -> bool {
        self.status == MembershipStatus::Approved && self.is_active
    }

    /// Approved, active, and of the admin member type.
    pub fn grants_institution_admin(&self) -> bool {
        self.is_in_good_standing() && self.member_type == MemberType::Admin
    }
}

/// An explicit permission code granted to a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionAssignment {
    /// Grantee.
    pub principal_id: PrincipalId,
    /// Permission code (e.g. "users.approve").
    pub code: String,
    /// Revoked assignments stay in the store as inactive rows.
    #[serde(default)]
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Content and grants
// ---------------------------------------------------------------------------

/// A sellable or subscribable unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentProduct {
    /// Store key.
    pub id: ProductId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Retired products are never offered for purchase.
    #[serde(default)]
    pub is_active: bool,
    /// Whether an individual may buy this product outright.
    #[serde(default)]
    pub allows_individual_purchase: bool,
    /// Net (VAT-exclusive) price for individual purchase.
    #[serde(default)]
    pub individual_price: Option<Decimal>,
    /// Explicit VAT rate that overrides rule-based resolution when usable.
    #[serde(default)]
    pub vat_rate_id: Option<VatRateId>,
}

/// A single document in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Store key.
    pub id: ContentItemId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Free content is readable by everyone, including anonymous visitors.
    #[serde(default)]
    pub is_premium: bool,
    /// Products this item is sold or subscribed under.
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    /// ISO 3166 alpha-2 country the item is sold in, used for VAT.
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Permanent grant from a completed individual purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    /// Owner.
    pub principal_id: PrincipalId,
    /// Owned product.
    pub product_id: ProductId,
    /// When the purchase completed.
    #[serde(default)]
    pub acquired_at: Option<DateTime<Utc>>,
}

/// Lifecycle status of a subscription row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created but not yet activated (e.g. awaiting payment).
    Pending,
    /// Paid and running.
    Active,
    /// Administratively suspended.
    Suspended,
    /// Lapsed.
    Expired,
}

impl SubscriptionStatus {
    /// Return the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coverage of one product by an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionSubscription {
    /// Subscriber.
    pub institution_id: InstitutionId,
    /// Covered product.
    pub product_id: ProductId,
    /// Lifecycle status.
    pub status: SubscriptionStatus,
    /// First covered instant (inclusive).
    pub start_date: DateTime<Utc>,
    /// Last covered instant (inclusive).
    pub end_date: DateTime<Utc>,
}

impl InstitutionSubscription {
    /// Active, started, and not past its end date.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.start_date <= now && now <= self.end_date
    }
}

/// A personal subscription or, when `is_trial` is set, a trial grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalSubscription {
    /// Subscriber.
    pub principal_id: PrincipalId,
    /// Covered product.
    pub product_id: ProductId,
    /// Lifecycle status.
    pub status: SubscriptionStatus,
    /// First covered instant (inclusive).
    pub start_date: DateTime<Utc>,
    /// Last covered instant (inclusive).
    pub end_date: DateTime<Utc>,
    /// Trial grants share the shape of a subscription.
    #[serde(default)]
    pub is_trial: bool,
}

impl PersonalSubscription {
    /// Active, started, and not past its end date.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.start_date <= now && now <= self.end_date
    }
}

// ---------------------------------------------------------------------------
// VAT
// ---------------------------------------------------------------------------

/// A configured VAT rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate {
    /// Store key.
    pub id: VatRateId,
    /// Short code (e.g. "VAT16").
    pub code: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Percentage, e.g. `16` for 16%.
    pub rate_percent: Decimal,
    /// Country the rate is defined for, informational.
    #[serde(default)]
    pub country_code: Option<String>,
    /// Disabled rates are never used.
    #[serde(default)]
    pub is_active: bool,
    /// Validity window.
    #[serde(flatten)]
    pub window: EffectiveWindow,
}

impl VatRate {
    /// Active, inside its window at `now`, with a non-negative percentage.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.window.contains(now) && !self.rate_percent.is_sign_negative()
    }
}

/// How specifically a [`VatRule`] matched the requested country.
///
/// Ordered most specific first, so sorting ascending prefers exact matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CountryMatch {
    /// The rule names the requested country.
    Exact,
    /// The rule uses the `*` wildcard.
    Wildcard,
    /// The rule has no country at all.
    Any,
}

/// Maps a purchase purpose (and optionally a country) to a VAT rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRule {
    /// Store key.
    pub id: VatRuleId,
    /// Purpose string (e.g. "PublicLegalDocumentPurchase").
    pub purpose: String,
    /// Exact country code, `*`, or `None` for any country.
    #[serde(default)]
    pub country_code: Option<String>,
    /// The rate this rule resolves to.
    pub vat_rate_id: VatRateId,
    /// Higher wins.
    #[serde(default)]
    pub priority: i32,
    /// Disabled rules are skipped.
    #[serde(default)]
    pub is_active: bool,
    /// Validity window.
    #[serde(flatten)]
    pub window: EffectiveWindow,
}

impl VatRule {
    /// Whether this rule is for `purpose` (trimmed, ASCII case-insensitive).
    pub fn is_for_purpose(&self, purpose: &str) -> bool {
        self.purpose.trim().eq_ignore_ascii_case(purpose.trim())
    }

    /// Classify how this rule's country applies to `country`.
    ///
    /// Returns `None` when the rule is scoped to a different country.
    pub fn country_match(&self, country: Option<&str>) -> Option<CountryMatch> {
        let rule_country = match self.country_code.as_deref().map(str::trim) {
            None | Some("") => return Some(CountryMatch::Any),
            Some(c) => c,
        };
        if rule_country == COUNTRY_WILDCARD {
            return Some(CountryMatch::Wildcard);
        }
        match country.map(str::trim) {
            Some(requested) if rule_country.eq_ignore_ascii_case(requested) => {
                Some(CountryMatch::Exact)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Usage audit
// ---------------------------------------------------------------------------

/// One recorded access decision, deduplicated per (principal, item, surface).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Row key.
    pub id: Uuid,
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
    /// Client address, bounded.
    pub ip_address: String,
    /// Client user agent, bounded.
    pub user_agent: String,
    /// When the access was recorded.
    pub occurred_at: DateTime<Utc>,
}
