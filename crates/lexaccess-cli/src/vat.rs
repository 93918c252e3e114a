//! # VAT Subcommand
//!
//! - `resolve`: the rate a purpose and country resolve to, with its source.
//! - `quote`: split an amount into net, VAT, and gross under that rate.
//!
//! Resolution never fails on misconfiguration: a missing or unusable rate
//! resolves to 0% and the source says why.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use lexaccess_core::{EngineConfig, VatRateId};
use lexaccess_tax::{TaxCalculator, TaxQuote, TaxRuleResolver, VatResolution, VatSource};

use crate::context::{load_snapshot, print_json, resolve_instant};

/// Arguments for the `lexaccess vat` subcommand.
#[derive(Args, Debug)]
pub struct VatArgs {
    #[command(subcommand)]
    pub command: VatCommand,
}

/// VAT subcommands.
#[derive(Subcommand, Debug)]
pub enum VatCommand {
    /// Resolve the applicable VAT rate.
    Resolve(ResolveArgs),

    /// Price an amount under the applicable VAT rate.
    Quote {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Amount to price.
        #[arg(long)]
        amount: Decimal,
        /// Treat the amount as VAT-inclusive.
        #[arg(long)]
        gross: bool,
    },
}

/// Inputs shared by `resolve` and `quote`.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Path to the state snapshot.
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Purchase purpose (e.g. "RegistrationFee").
    #[arg(long)]
    pub purpose: String,

    /// ISO 3166 alpha-2 country code.
    #[arg(long)]
    pub country: Option<String>,

    /// Explicit rate that wins over every rule when usable.
    #[arg(long, value_name = "ID")]
    pub rate_id: Option<VatRateId>,

    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<String>,
}

/// What `lexaccess vat quote` prints.
#[derive(Debug, Serialize)]
pub struct QuoteReport {
    /// Where the rate came from.
    pub vat_source: VatSource,
    /// The priced amount.
    pub quote: TaxQuote,
}

/// Execute the vat subcommand.
pub fn run_vat(args: &VatArgs, config: &EngineConfig) -> Result<u8> {
    match &args.command {
        VatCommand::Resolve(resolve_args) => print_json(&resolve(resolve_args, config)?)?,
        VatCommand::Quote {
            resolve: resolve_args,
            amount,
            gross,
        } => print_json(&quote(resolve_args, *amount, *gross, config)?)?,
    }
    Ok(0)
}

/// Resolve the rate for `args`.
pub fn resolve(args: &ResolveArgs, config: &EngineConfig) -> Result<VatResolution> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let now = resolve_instant(args.at.as_deref())?;
    let resolver = TaxRuleResolver::new(snapshot, config.tax.clone());
    Ok(resolver.resolve_at(&args.purpose, args.country.as_deref(), args.rate_id, now))
}

/// Price `amount` under the rate resolved for `args`.
pub fn quote(
    args: &ResolveArgs,
    amount: Decimal,
    gross: bool,
    config: &EngineConfig,
) -> Result<QuoteReport> {
    let resolution = resolve(args, config)?;
    let rate = resolution.rate.as_ref();
    let priced = if gross {
        TaxCalculator::from_gross_inclusive(amount, rate)
    } else {
        TaxCalculator::from_net(amount, rate)
    };
    let quote = priced.with_context(|| format!("cannot price {amount}"))?;
    Ok(QuoteReport {
        vat_source: resolution.source,
        quote,
    })
}
