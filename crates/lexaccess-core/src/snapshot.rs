//! # In-Memory Snapshot Store
//!
//! [`Snapshot`] holds a complete read-only copy of every row the engine
//! consults and implements all read store traits over it. It backs the CLI
//! (loaded from a YAML or JSON document) and the test suites.
//!
//! Lookups are linear scans. Snapshots are small and immutable once loaded.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, ValidationError};
use crate::identity::{ContentItemId, InstitutionId, PrincipalId, ProductId, VatRateId};
use crate::model::{
    ContentItem, ContentProduct, Institution, InstitutionSubscription, MemberType, Membership,
    Ownership, PermissionAssignment, PersonalSubscription, Principal, VatRate, VatRule,
};
use crate::store::{
    InstitutionStore, MembershipStore, OwnershipStore, PermissionStore, PrincipalDirectory,
    ProductCatalog, SubscriptionStore, VatStore,
};

/// A complete, immutable copy of the externally-owned state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// User accounts.
    pub principals: Vec<Principal>,
    /// Subscribing organisations.
    pub institutions: Vec<Institution>,
    /// Institution memberships.
    pub memberships: Vec<Membership>,
    /// Permission-code assignments.
    pub permissions: Vec<PermissionAssignment>,
    /// Product catalogue.
    pub products: Vec<ContentProduct>,
    /// Library documents.
    pub content_items: Vec<ContentItem>,
    /// Completed individual purchases.
    pub ownerships: Vec<Ownership>,
    /// Institution coverage rows.
    pub institution_subscriptions: Vec<InstitutionSubscription>,
    /// Personal subscriptions and trial grants.
    pub personal_subscriptions: Vec<PersonalSubscription>,
    /// VAT rates.
    pub vat_rates: Vec<VatRate>,
    /// VAT resolution rules.
    pub vat_rules: Vec<VatRule>,
}

impl Snapshot {
    /// Decode a snapshot from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Snapshot`] if the document does not decode.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ValidationError> {
        serde_yaml::from_str(yaml).map_err(|e| ValidationError::Snapshot(e.to_string()))
    }

    /// Decode a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Snapshot`] if the document does not decode.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::Snapshot(e.to_string()))
    }

    /// Load a snapshot file. `.json` files decode as JSON, anything else as
    /// YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Snapshot`] if the file cannot be read or
    /// does not decode.
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::Snapshot(format!("cannot read {}: {e}", path.display()))
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_yaml_str(&raw)
        }
    }

    /// Look up a document by id.
    pub fn content_item(&self, id: ContentItemId) -> Option<&ContentItem> {
        self.content_items.iter().find(|item| item.id == id)
    }
}

impl PrincipalDirectory for Snapshot {
    fn principal(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError> {
        Ok(self.principals.iter().find(|p| p.id == id).cloned())
    }
}

impl MembershipStore for Snapshot {
    fn membership(
        &self,
        principal_id: PrincipalId,
        institution_id: InstitutionId,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .memberships
            .iter()
            .find(|m| m.principal_id == principal_id && m.institution_id == institution_id)
            .cloned())
    }

    fn memberships_of_type(
        &self,
        institution_id: InstitutionId,
        member_type: MemberType,
    ) -> Result<Vec<Membership>, StoreError> {
        Ok(self
            .memberships
            .iter()
            .filter(|m| m.institution_id == institution_id && m.member_type == member_type)
            .cloned()
            .collect())
    }
}

impl PermissionStore for Snapshot {
    fn has_active_permission(
        &self,
        principal_id: PrincipalId,
        code: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .permissions
            .iter()
            .any(|p| p.principal_id == principal_id && p.is_active && p.code == code))
    }
}

impl InstitutionStore for Snapshot {
    fn institution(&self, id: InstitutionId) -> Result<Option<Institution>, StoreError> {
        Ok(self.institutions.iter().find(|i| i.id == id).cloned())
    }
}

impl SubscriptionStore for Snapshot {
    fn institution_subscriptions(
        &self,
        institution_id: InstitutionId,
        product_ids: &[ProductId],
    ) -> Result<Vec<InstitutionSubscription>, StoreError> {
        Ok(self
            .institution_subscriptions
            .iter()
            .filter(|s| s.institution_id == institution_id && product_ids.contains(&s.product_id))
            .cloned()
            .collect())
    }

    fn personal_subscriptions(
        &self,
        principal_id: PrincipalId,
        product_ids: &[ProductId],
    ) -> Result<Vec<PersonalSubscription>, StoreError> {
        Ok(self
            .personal_subscriptions
            .iter()
            .filter(|s| s.principal_id == principal_id && product_ids.contains(&s.product_id))
            .cloned()
            .collect())
    }
}

impl OwnershipStore for Snapshot {
    fn owns_any(
        &self,
        principal_id: PrincipalId,
        product_ids: &[ProductId],
    ) -> Result<bool, StoreError> {
        Ok(self
            .ownerships
            .iter()
            .any(|o| o.principal_id == principal_id && product_ids.contains(&o.product_id)))
    }
}

impl ProductCatalog for Snapshot {
    fn products(&self, product_ids: &[ProductId]) -> Result<Vec<ContentProduct>, StoreError> {
        let mut found: Vec<ContentProduct> = self
            .products
            .iter()
            .filter(|p| product_ids.contains(&p.id))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }
}

impl VatStore for Snapshot {
    fn vat_rate(&self, id: VatRateId) -> Result<Option<VatRate>, StoreError> {
        Ok(self.vat_rates.iter().find(|r| r.id == id).cloned())
    }

    fn vat_rate_by_code(&self, code: &str) -> Result<Option<VatRate>, StoreError> {
        let code = code.trim();
        Ok(self
            .vat_rates
            .iter()
            .find(|r| r.code.trim().eq_ignore_ascii_case(code))
            .cloned())
    }

    fn vat_rules(&self) -> Result<Vec<VatRule>, StoreError> {
        Ok(self.vat_rules.clone())
    }
}
