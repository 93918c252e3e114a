//! # VAT Arithmetic
//!
//! Turns a resolved [`VatRate`] (or its absence, meaning 0%) into a
//! [`TaxQuote`]. All amounts are [`Decimal`] and every rounding step rounds
//! to two decimal places, midpoints away from zero.
//!
//! ## Exactness
//!
//! Only one of the three amounts is ever rounded. The third is derived by
//! exact addition or subtraction, so `net_amount + vat_amount ==
//! gross_amount` holds without tolerance for both directions.
//!
//! Converting net to gross and back can drift by at most
//! [`ROUND_TRIP_TOLERANCE`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lexaccess_core::VatRate;

/// Maximum difference between `x` and
/// `from_gross_inclusive(from_net(x).gross_amount).net_amount`.
pub const ROUND_TRIP_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal places of every rounded amount.
const MONEY_SCALE: u32 = 2;

/// Errors from VAT arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxError {
    /// An intermediate value left the representable decimal range.
    #[error("arithmetic overflow while computing the {step} amount")]
    Overflow {
        /// Which amount overflowed (`vat`, `gross`, `divisor` or `net`).
        step: &'static str,
    },

    /// The rate cannot be applied (negative percentage).
    #[error("VAT rate {code} has unusable percentage {percent}")]
    InvalidRate {
        /// Rate code.
        code: String,
        /// Offending percentage.
        percent: Decimal,
    },

    /// Amounts to price must not be negative.
    #[error("cannot price negative {which} amount {amount}")]
    NegativeAmount {
        /// Which amount was supplied (`net` or `gross`).
        which: &'static str,
        /// Offending amount.
        amount: Decimal,
    },
}

/// A priced amount split into net, VAT, and gross.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxQuote {
    /// Code of the applied rate. `None` when no VAT applies.
    pub vat_code: Option<String>,
    /// Applied percentage, `0` when no VAT applies.
    pub vat_rate_percent: Decimal,
    /// VAT-exclusive amount.
    pub net_amount: Decimal,
    /// VAT portion.
    pub vat_amount: Decimal,
    /// VAT-inclusive amount.
    pub gross_amount: Decimal,
}

impl TaxQuote {
    /// Whether a non-zero VAT rate was applied.
    pub fn is_taxed(&self) -> bool {
        !self.vat_rate_percent.is_zero()
    }
}

/// Stateless VAT arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxCalculator;

impl TaxCalculator {
    /// Price a VAT-exclusive amount.
    ///
    /// `vat = round(net × pct / 100)`, `gross = net + vat`. `None` applies 0%.
    ///
    /// # Errors
    ///
    /// [`TaxError::NegativeAmount`] for a negative `net`,
    /// [`TaxError::InvalidRate`] for a negative percentage,
    /// [`TaxError::Overflow`] if the product leaves the decimal range.
    pub fn from_net(net: Decimal, rate: Option<&VatRate>) -> Result<TaxQuote, TaxError> {
        non_negative("net", net)?;
        let (vat_code, percent) = applied_percent(rate)?;
        let vat = net
            .checked_mul(percent)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or(TaxError::Overflow { step: "vat" })?;
        let vat = round_money(vat);
        let gross = net
            .checked_add(vat)
            .ok_or(TaxError::Overflow { step: "gross" })?;
        Ok(TaxQuote {
            vat_code,
            vat_rate_percent: percent,
            net_amount: net,
            vat_amount: vat,
            gross_amount: gross,
        })
    }

    /// Split a VAT-inclusive amount.
    ///
    /// `net = round(gross / (1 + pct / 100))`, `vat = gross − net`.
    ///
    /// # Errors
    ///
    /// Same as [`TaxCalculator::from_net`].
    pub fn from_gross_inclusive(
        gross: Decimal,
        rate: Option<&VatRate>,
    ) -> Result<TaxQuote, TaxError> {
        non_negative("gross", gross)?;
        let (vat_code, percent) = applied_percent(rate)?;
        let divisor = percent
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|f| f.checked_add(Decimal::ONE))
            .ok_or(TaxError::Overflow { step: "divisor" })?;
        let net = gross
            .checked_div(divisor)
            .ok_or(TaxError::Overflow { step: "net" })?;
        let net = round_money(net);
        let vat = gross
            .checked_sub(net)
            .ok_or(TaxError::Overflow { step: "vat" })?;
        Ok(TaxQuote {
            vat_code,
            vat_rate_percent: percent,
            net_amount: net,
            vat_amount: vat,
            gross_amount: gross,
        })
    }
}

fn non_negative(which: &'static str, amount: Decimal) -> Result<(), TaxError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(TaxError::NegativeAmount { which, amount });
    }
    Ok(())
}

fn applied_percent(rate: Option<&VatRate>) -> Result<(Option<String>, Decimal), TaxError> {
    match rate {
        None => Ok((None, Decimal::ZERO)),
        Some(rate) if rate.rate_percent.is_sign_negative() && !rate.rate_percent.is_zero() => {
            Err(TaxError::InvalidRate {
                code: rate.code.clone(),
                percent: rate.rate_percent,
            })
        }
        Some(rate) => Ok((Some(rate.code.clone()), rate.rate_percent)),
    }
}

fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}
