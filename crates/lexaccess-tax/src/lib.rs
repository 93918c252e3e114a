#![deny(missing_docs)]

//! # lexaccess-tax: VAT Resolution and Pricing
//!
//! Two pieces used by purchase and invoicing flows:
//!
//! - [`TaxRuleResolver`] picks the VAT rate for a purchase purpose and
//!   country from the VAT store, falling back observably to 0%.
//! - [`TaxCalculator`] splits amounts into net, VAT, and gross with
//!   two-decimal rounding.
//!
//! The access evaluator uses both to price individual purchase offers, but
//! neither depends on entitlement state.

pub mod calculator;
pub mod resolver;

pub use calculator::{TaxCalculator, TaxError, TaxQuote, ROUND_TRIP_TOLERANCE};
pub use resolver::{TaxRuleResolver, VatResolution, VatSource, VAT_FALLBACK_COUNTER};
