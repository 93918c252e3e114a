//! # Wire-Stable Decision Codes
//!
//! [`DenyReason`] identifiers and numeric codes are consumed by deployed
//! clients. Variant names serialize verbatim (`"NotEntitled"`), and
//! [`DenyReason::code`] values never change.

use serde::{Deserialize, Serialize};

/// Binary outcome of an entitlement evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    /// The whole document is readable.
    FullAccess,
    /// Only the preview is readable.
    PreviewOnly,
}

/// Why a decision is not [`AccessLevel::FullAccess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenyReason {
    /// Not denied.
    None,
    /// The principal's institution holds a stake in the content but its
    /// subscription is not currently honoured. Hard block.
    InstitutionSubscriptionInactive,
    /// The institution's plan has no seat left for this member. Hard block.
    InstitutionSeatLimitExceeded,
    /// No grant applies. Resolvable by purchase or subscription.
    NotEntitled,
}

impl DenyReason {
    /// Numeric wire code.
    pub const fn code(self) -> u16 {
        match self {
            Self::None => 0,
            Self::InstitutionSubscriptionInactive => 1001,
            Self::InstitutionSeatLimitExceeded => 1002,
            Self::NotEntitled => 2000,
        }
    }

    /// Reverse of [`DenyReason::code`].
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1001 => Some(Self::InstitutionSubscriptionInactive),
            1002 => Some(Self::InstitutionSeatLimitExceeded),
            2000 => Some(Self::NotEntitled),
            _ => None,
        }
    }

    /// Verbatim wire identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::InstitutionSubscriptionInactive => "InstitutionSubscriptionInactive",
            Self::InstitutionSeatLimitExceeded => "InstitutionSeatLimitExceeded",
            Self::NotEntitled => "NotEntitled",
        }
    }

    /// Reasons callers must turn into a blocking "contact your administrator"
    /// response rather than a purchase offer.
    pub const fn is_institution_block(self) -> bool {
        matches!(
            self,
            Self::InstitutionSubscriptionInactive | Self::InstitutionSeatLimitExceeded
        )
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome classification of an institution coverage check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageReason {
    /// A current active subscription covers the products.
    Active,
    /// No institution id was supplied.
    NoInstitution,
    /// The institution is missing or deactivated.
    InstitutionInactive,
    /// No product ids were supplied.
    NoProducts,
    /// The institution does not subscribe to any of the products.
    NoSubscriptionRow,
    /// A covering subscription is suspended.
    Suspended,
    /// A covering subscription has lapsed.
    Expired,
    /// A covering subscription has not started or is pending.
    NotStarted,
    /// Rows exist but none covers the products right now.
    NotEntitled,
}

impl CoverageReason {
    /// Verbatim identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::NoInstitution => "NoInstitution",
            Self::InstitutionInactive => "InstitutionInactive",
            Self::NoProducts => "NoProducts",
            Self::NoSubscriptionRow => "NoSubscriptionRow",
            Self::Suspended => "Suspended",
            Self::Expired => "Expired",
            Self::NotStarted => "NotStarted",
            Self::NotEntitled => "NotEntitled",
        }
    }
}

impl std::fmt::Display for CoverageReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
