//! # lexaccess-cli: Command-Line Front End
//!
//! Provides the `lexaccess` binary. Every subcommand loads a state
//! [`Snapshot`](lexaccess_core::Snapshot) (YAML or JSON), runs one engine
//! operation against it, and prints the result as pretty JSON on stdout.
//!
//! ## Subcommands
//!
//! - `lexaccess access`: full access or preview for one document.
//! - `lexaccess coverage`: institution subscription classification.
//! - `lexaccess vat resolve`: the VAT rate for a purpose and country.
//! - `lexaccess vat quote`: a net/VAT/gross split for an amount.
//!
//! ```bash
//! lexaccess access --snapshot state.yaml --item 5000 --principal 1
//! lexaccess vat quote --snapshot state.yaml --purpose RegistrationFee --country KE --amount 100
//! ```

pub mod access;
pub mod context;
pub mod coverage;
pub mod vat;

#[cfg(test)]
mod fixtures;
