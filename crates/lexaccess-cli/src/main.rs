//! # lexaccess CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads
//! configuration, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lexaccess_cli::access::{run_access, AccessArgs};
use lexaccess_cli::context::load_config;
use lexaccess_cli::coverage::{run_coverage, CoverageArgs};
use lexaccess_cli::vat::{run_vat, VatArgs};

/// Entitlement and pricing decisions for a legal content library.
///
/// Evaluates document access, institution coverage, and VAT against a state
/// snapshot and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "lexaccess", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide full access or preview for one document.
    Access(AccessArgs),

    /// Classify an institution's subscription coverage.
    Coverage(CoverageArgs),

    /// Resolve VAT rates and price amounts.
    Vat(VatArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "lexaccess starting");

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Access(args) => run_access(args, &config),
        Commands::Coverage(args) => run_coverage(args, &config),
        Commands::Vat(args) => run_vat(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
