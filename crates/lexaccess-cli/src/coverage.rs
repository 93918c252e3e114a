//! # Coverage Subcommand
//!
//! Classifies an institution's subscription coverage of one or more
//! products. The grace period defaults to the configured
//! `access.coverage_grace_days`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use lexaccess_core::{EngineConfig, InstitutionId, ProductId};
use lexaccess_entitlement::{CoverageDecision, InstitutionCoverageGuard};

use crate::context::{load_snapshot, print_json, read_budget, resolve_instant};

/// Arguments for the `lexaccess coverage` subcommand.
#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Path to the state snapshot.
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Institution to classify.
    #[arg(long, value_name = "ID")]
    pub institution: InstitutionId,

    /// Products the content is sold under. Repeat for several.
    #[arg(long = "product", value_name = "ID", required = true)]
    pub products: Vec<ProductId>,

    /// Days past an end date before a subscription counts as expired.
    #[arg(long)]
    pub grace_days: Option<u32>,

    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<String>,
}

/// Execute the coverage subcommand.
pub fn run_coverage(args: &CoverageArgs, config: &EngineConfig) -> Result<u8> {
    let decision = classify(args, config)?;
    print_json(&decision)?;
    Ok(0)
}

/// Classify coverage for `args` without printing.
pub fn classify(args: &CoverageArgs, config: &EngineConfig) -> Result<CoverageDecision> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let now = resolve_instant(args.at.as_deref())?;
    let default_grace = config.access.coverage_grace_days;
    let grace_days = args.grace_days.unwrap_or(default_grace);

    InstitutionCoverageGuard::new(snapshot)
        .evaluate_coverage(
            args.institution,
            &args.products,
            now,
            grace_days,
            &read_budget(None),
        )
        .with_context(|| {
            format!(
                "could not classify coverage for institution {}",
                args.institution
            )
        })
}
