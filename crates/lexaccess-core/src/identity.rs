//! # Identity Newtypes
//!
//! Domain-primitive newtypes for every row identifier the engine reads.
//! Each identifier is a distinct type, so you cannot pass a [`ProductId`]
//! where an [`InstitutionId`] is expected.
//!
//! Identifiers are the integer keys of the externally-owned store. Zero and
//! negative values are representable (stores hand them back, request routes
//! carry them) but never refer to a real row; [`InstitutionId::is_assigned`]
//! and friends make that check explicit.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store key.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Access the raw store key.
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Whether this id can refer to a stored row (strictly positive).
            pub const fn is_assigned(self) -> bool {
                self.0 > 0
            }

            /// Parse an identity or route claim.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::InvalidId`] unless the trimmed claim
            /// is a strictly positive integer.
            pub fn parse_claim(claim: &str) -> Result<Self, ValidationError> {
                match claim.trim().parse::<i64>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(ValidationError::InvalidId {
                        kind: $kind,
                        value: claim.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_claim(s)
            }
        }
    };
}

integer_id!(
    /// A user account that requests access to content.
    PrincipalId,
    "principal"
);

integer_id!(
    /// A subscribing organisation (law firm, university, court library).
    InstitutionId,
    "institution"
);

integer_id!(
    /// A sellable or subscribable content product.
    ProductId,
    "product"
);

integer_id!(
    /// A single content item (document) in the library.
    ContentItemId,
    "content item"
);

integer_id!(
    /// A configured VAT rate row.
    VatRateId,
    "vat rate"
);

integer_id!(
    /// A VAT resolution rule row.
    VatRuleId,
    "vat rule"
);
