#![deny(missing_docs)]

//! # lexaccess-core: Foundational Types for lexaccess
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for row identifiers.** You cannot pass a
//!    [`ProductId`] where an [`InstitutionId`] is expected.
//!
//! 2. **Read-only collaborators.** The engine consumes externally-owned state
//!    through the object-safe traits in [`store`]. [`Snapshot`] is the
//!    in-memory implementation used by the CLI and the test suites.
//!
//! 3. **Denials are values, failures are errors.** [`DenyReason`] travels in
//!    decisions; [`EngineError`] means no decision could be made.
//!
//! 4. **Explicit configuration.** [`EngineConfig`] is passed to constructors,
//!    never read from global state.

pub mod budget;
pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod reason;
pub mod snapshot;
pub mod store;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use budget::{CancellationFlag, ReadBudget};
pub use config::{AccessConfig, AuditConfig, ConfigError, EngineConfig, HardDefaultRate, TaxConfig};
pub use error::{EngineError, StoreError, ValidationError};
pub use identity::{ContentItemId, InstitutionId, PrincipalId, ProductId, VatRateId, VatRuleId};
pub use model::{
    ContentItem, ContentProduct, CountryMatch, Institution, InstitutionSubscription, MemberType,
    Membership, MembershipStatus, Ownership, PermissionAssignment, PersonalSubscription,
    Principal, SubscriptionStatus, UsageEvent, VatRate, VatRule, ADMIN_ROLE, COUNTRY_WILDCARD,
};
pub use reason::{AccessLevel, CoverageReason, DenyReason};
pub use snapshot::Snapshot;
pub use store::{
    AuthzDirectory, EntitlementStore, InstitutionStore, MembershipStore, OwnershipStore,
    PermissionStore, PrincipalDirectory, ProductCatalog, SubscriptionStore, UsageEventSink,
    VatStore,
};
pub use temporal::{parse_utc, EffectiveWindow};
