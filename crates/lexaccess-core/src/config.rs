//! Engine configuration.
//!
//! [`EngineConfig`] is an explicit value handed to each engine component at
//! construction. Nothing reads configuration from global state, so the same
//! inputs always produce the same decision.
//!
//! Sources, later wins: built-in defaults, a YAML document, environment
//! variables (see [`EngineConfig::apply_env_overrides`]).

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default purchase purpose used to resolve VAT for individual purchases.
pub const DEFAULT_PURCHASE_PURPOSE: &str = "PublicLegalDocumentPurchase";

/// Default audit dedupe window.
pub const DEFAULT_THROTTLE_WINDOW_SECS: u64 = 180;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Access evaluation settings.
    pub access: AccessConfig,
    /// VAT resolution settings.
    pub tax: TaxConfig,
    /// Usage audit settings.
    pub audit: AuditConfig,
}

/// Access evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// VAT purpose used when pricing an individual purchase offer.
    pub purchase_purpose: String,
    /// Days past a subscription's end date before it classifies as expired.
    pub coverage_grace_days: u32,
    /// Whether institution seat limits are enforced.
    pub enforce_seat_limits: bool,
    /// ISO 4217 currency of product prices.
    pub currency: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            purchase_purpose: DEFAULT_PURCHASE_PURPOSE.to_string(),
            coverage_grace_days: 0,
            enforce_seat_limits: true,
            currency: "KES".to_string(),
        }
    }
}

/// VAT resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Rate used when no explicit rate or rule applies. `None` disables it.
    pub hard_default: Option<HardDefaultRate>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            hard_default: Some(HardDefaultRate::default()),
        }
    }
}

/// The single hard-coded fallback: a purpose and country pair resolved to a
/// rate code when no rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardDefaultRate {
    /// Purpose the fallback applies to.
    pub purpose: String,
    /// Country the fallback applies to.
    pub country_code: String,
    /// Code of the rate to use.
    pub vat_code: String,
}

impl Default for HardDefaultRate {
    fn default() -> Self {
        Self {
            purpose: "RegistrationFee".to_string(),
            country_code: "KE".to_string(),
            vat_code: "VAT16".to_string(),
        }
    }
}

impl HardDefaultRate {
    /// Whether this fallback applies to the request.
    pub fn applies_to(&self, purpose: &str, country: Option<&str>) -> bool {
        self.purpose.eq_ignore_ascii_case(purpose.trim())
            && country.is_some_and(|c| self.country_code.eq_ignore_ascii_case(c.trim()))
    }
}

/// Usage audit settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Repeat events inside this window are suppressed.
    pub throttle_window_secs: u64,
    /// IP addresses are truncated to this many characters.
    pub max_ip_len: usize,
    /// User agents are truncated to this many characters.
    pub max_user_agent_len: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            throttle_window_secs: DEFAULT_THROTTLE_WINDOW_SECS,
            max_ip_len: 64,
            max_user_agent_len: 400,
        }
    }
}

impl EngineConfig {
    /// Decode a YAML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the document does not decode.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and decode a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Yaml`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_yaml_str(&raw)
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::apply_env_overrides`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override fields from environment variables:
    /// - `LEXACCESS_PURCHASE_PURPOSE`
    /// - `LEXACCESS_GRACE_DAYS`
    /// - `LEXACCESS_ENFORCE_SEAT_LIMITS` (`true`/`false`)
    /// - `LEXACCESS_AUDIT_WINDOW_SECS`
    /// - `LEXACCESS_CURRENCY`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable is set but does
    /// not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(purpose) = env_string("LEXACCESS_PURCHASE_PURPOSE") {
            self.access.purchase_purpose = purpose;
        }
        if let Some(days) = env_parsed::<u32>("LEXACCESS_GRACE_DAYS")? {
            self.access.coverage_grace_days = days;
        }
        if let Some(enforce) = env_parsed::<bool>("LEXACCESS_ENFORCE_SEAT_LIMITS")? {
            self.access.enforce_seat_limits = enforce;
        }
        if let Some(window) = env_parsed::<u64>("LEXACCESS_AUDIT_WINDOW_SECS")? {
            self.audit.throttle_window_secs = window;
        }
        if let Some(currency) = env_string("LEXACCESS_CURRENCY") {
            self.access.currency = currency;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.access.purchase_purpose.trim().is_empty() {
            return Err(ConfigError::Invalid("access.purchase_purpose must be non-empty".into()));
        }
        if self.audit.max_ip_len == 0 || self.audit.max_user_agent_len == 0 {
            return Err(ConfigError::Invalid("audit field bounds must be at least 1".into()));
        }
        Ok(())
    }
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value: raw,
            }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(std::io::Error),
    /// The configuration document did not decode.
    #[error("invalid configuration document: {0}")]
    Yaml(serde_yaml::Error),
    /// An environment override did not parse.
    #[error("environment variable {var} has unparseable value \"{value}\"")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
    },
    /// A decoded value violates a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
