//! # Collaborator Store Traits
//!
//! The engine never owns persistence. Each trait below is the read (or, for
//! [`UsageEventSink`], write) surface of one externally-owned store.
//!
//! Implementations must be `Send + Sync` so they can be shared behind an
//! `Arc` across threads. Every trait is object-safe so deployments can pick
//! a backend at runtime; [`crate::snapshot::Snapshot`] is the in-memory one.
//!
//! Reads return the latest committed state. A missing row is `Ok(None)` or an
//! empty collection, never an error; [`StoreError`] is reserved for a store
//! that could not answer.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::identity::{ContentItemId, InstitutionId, PrincipalId, ProductId, VatRateId};
use crate::model::{
    ContentProduct, Institution, InstitutionSubscription, MemberType, Membership,
    PersonalSubscription, Principal, UsageEvent, VatRate, VatRule,
};

/// Principal lookup.
pub trait PrincipalDirectory: Send + Sync {
    /// Load a principal by id.
    fn principal(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError>;
}

/// Institution membership lookup.
pub trait MembershipStore: Send + Sync {
    /// The membership row for (principal, institution), if any.
    fn membership(
        &self,
        principal_id: PrincipalId,
        institution_id: InstitutionId,
    ) -> Result<Option<Membership>, StoreError>;

    /// Every membership of `member_type` in `institution_id`, in any status.
    fn memberships_of_type(
        &self,
        institution_id: InstitutionId,
        member_type: MemberType,
    ) -> Result<Vec<Membership>, StoreError>;
}

/// Explicit permission-code assignments.
pub trait PermissionStore: Send + Sync {
    /// Whether an active assignment of `code` exists for the principal.
    fn has_active_permission(
        &self,
        principal_id: PrincipalId,
        code: &str,
    ) -> Result<bool, StoreError>;
}

/// Institution lookup.
pub trait InstitutionStore: Send + Sync {
    /// Load an institution by id.
    fn institution(&self, id: InstitutionId) -> Result<Option<Institution>, StoreError>;
}

/// Institution and personal subscription rows.
pub trait SubscriptionStore: Send + Sync {
    /// Rows for `institution_id` covering any of `product_ids`.
    fn institution_subscriptions(
        &self,
        institution_id: InstitutionId,
        product_ids: &[ProductId],
    ) -> Result<Vec<InstitutionSubscription>, StoreError>;

    /// Personal subscriptions and trial grants of `principal_id` covering any
    /// of `product_ids`.
    fn personal_subscriptions(
        &self,
        principal_id: PrincipalId,
        product_ids: &[ProductId],
    ) -> Result<Vec<PersonalSubscription>, StoreError>;
}

/// Permanent individual purchases.
pub trait OwnershipStore: Send + Sync {
    /// Whether the principal owns any of `product_ids`.
    fn owns_any(
        &self,
        principal_id: PrincipalId,
        product_ids: &[ProductId],
    ) -> Result<bool, StoreError>;
}

/// Product catalogue.
pub trait ProductCatalog: Send + Sync {
    /// Products with the given ids, in ascending id order. Unknown ids are
    /// skipped.
    fn products(&self, product_ids: &[ProductId]) -> Result<Vec<ContentProduct>, StoreError>;
}

/// VAT rates and rules.
pub trait VatStore: Send + Sync {
    /// Load a rate by id.
    fn vat_rate(&self, id: VatRateId) -> Result<Option<VatRate>, StoreError>;

    /// Load a rate by its code (ASCII case-insensitive).
    fn vat_rate_by_code(&self, code: &str) -> Result<Option<VatRate>, StoreError>;

    /// Every rule, active or not. Filtering is the resolver's job.
    fn vat_rules(&self) -> Result<Vec<VatRule>, StoreError>;
}

/// Append-only destination for usage audit rows.
pub trait UsageEventSink: Send + Sync {
    /// Whether a row exists for (principal, item, surface) at or after `since`.
    fn has_event_since(
        &self,
        principal_id: PrincipalId,
        content_item_id: ContentItemId,
        surface: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Append a row.
    fn insert(&self, event: UsageEvent) -> Result<(), StoreError>;
}

/// Everything the predicate layer reads.
pub trait AuthzDirectory: PrincipalDirectory + MembershipStore + PermissionStore {}

impl<T> AuthzDirectory for T where
    T: ?Sized + PrincipalDirectory + MembershipStore + PermissionStore
{
}

/// Everything the access evaluator reads, apart from VAT.
pub trait EntitlementStore:
    PrincipalDirectory
    + MembershipStore
    + InstitutionStore
    + SubscriptionStore
    + OwnershipStore
    + ProductCatalog
{
}

impl<T> EntitlementStore for T where
    T: ?Sized
        + PrincipalDirectory
        + MembershipStore
        + InstitutionStore
        + SubscriptionStore
        + OwnershipStore
        + ProductCatalog
{
}
