//! # VAT Rule Resolution
//!
//! Picks the VAT rate for a purchase purpose and country. Resolution never
//! fails: it ends either in a usable [`VatRate`] or in an explicit 0%
//! ("no VAT") outcome.
//!
//! ## Order
//!
//! 1. An explicit rate id whose rate is usable at `now`.
//! 2. Active rules for the purpose whose window contains `now`. Exact
//!    country matches beat the `*` wildcard, which beats country-less rules.
//!    Within one country class the highest priority wins, then the lowest
//!    rule id. The first candidate whose referenced rate is usable decides.
//! 3. The configured hard default (purpose, country, rate code).
//! 4. 0%.
//!
//! Step 4 and store failures are fallbacks: each emits a `warn` event and
//! increments `lexaccess_vat_fallback_total`, labelled by source.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lexaccess_core::{
    CountryMatch, EngineError, ReadBudget, TaxConfig, VatRate, VatRateId, VatRule, VatRuleId,
    VatStore,
};

/// Metric name for VAT fallbacks.
pub const VAT_FALLBACK_COUNTER: &str = "lexaccess_vat_fallback_total";

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatSource {
    /// The caller's explicit rate id.
    ExplicitRate,
    /// A matching rule.
    Rule(VatRuleId),
    /// The configured hard default.
    HardDefault,
    /// Nothing matched; 0%.
    NoVat,
    /// The VAT store could not be read; 0%.
    StoreUnavailable,
}

impl VatSource {
    /// Return the string representation of this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitRate => "explicit_rate",
            Self::Rule(_) => "rule",
            Self::HardDefault => "hard_default",
            Self::NoVat => "no_vat",
            Self::StoreUnavailable => "store_unavailable",
        }
    }

    /// Whether the outcome is a 0% fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::NoVat | Self::StoreUnavailable)
    }
}

impl std::fmt::Display for VatSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rule(id) => write!(f, "rule {id}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Outcome of VAT resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatResolution {
    /// The rate to apply. `None` means 0%.
    pub rate: Option<VatRate>,
    /// Where it came from.
    pub source: VatSource,
}

impl VatResolution {
    /// The applied percentage, zero when no rate applies.
    pub fn rate_percent(&self) -> Decimal {
        self.rate
            .as_ref()
            .map(|r| r.rate_percent)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Resolves VAT rates from the VAT store.
///
/// Holds no state beyond its store handle and configuration. Identical store
/// contents, inputs, and `now` always resolve to the same rate.
#[derive(Clone)]
pub struct TaxRuleResolver {
    store: Arc<dyn VatStore>,
    config: TaxConfig,
}

impl TaxRuleResolver {
    /// Create a resolver over `store`.
    pub fn new(store: Arc<dyn VatStore>, config: TaxConfig) -> Self {
        Self { store, config }
    }

    /// Resolve the rate applicable right now. `None` means 0% VAT.
    pub fn resolve_vat_rate(
        &self,
        purpose: &str,
        country: Option<&str>,
        explicit_rate_id: Option<VatRateId>,
    ) -> Option<VatRate> {
        self.resolve_at(purpose, country, explicit_rate_id, Utc::now())
            .rate
    }

    /// Resolve the rate applicable at `now`, with its source.
    pub fn resolve_at(
        &self,
        purpose: &str,
        country: Option<&str>,
        explicit_rate_id: Option<VatRateId>,
        now: DateTime<Utc>,
    ) -> VatResolution {
        let budget = ReadBudget::unbounded();
        match self.resolve_within(purpose, country, explicit_rate_id, now, &budget) {
            Ok(resolution) => resolution,
            Err(err) => self.fall_back(VatSource::StoreUnavailable, purpose, country, Some(&err)),
        }
    }

    /// Resolve under a read budget.
    ///
    /// Store failures still fall back to 0%. Only a spent budget surfaces.
    ///
    /// # Errors
    ///
    /// [`EngineError::DeadlineExceeded`] or [`EngineError::Cancelled`].
    pub fn resolve_within(
        &self,
        purpose: &str,
        country: Option<&str>,
        explicit_rate_id: Option<VatRateId>,
        now: DateTime<Utc>,
        budget: &ReadBudget,
    ) -> Result<VatResolution, EngineError> {
        let country = country.map(str::trim).filter(|c| !c.is_empty());
        match self.lookup(purpose, country, explicit_rate_id, now, budget) {
            Ok(Some(resolution)) => Ok(resolution),
            Ok(None) => Ok(self.fall_back(VatSource::NoVat, purpose, country, None)),
            Err(EngineError::Store(err)) => Ok(self.fall_back(
                VatSource::StoreUnavailable,
                purpose,
                country,
                Some(&EngineError::Store(err)),
            )),
            Err(err) => Err(err),
        }
    }

    fn lookup(
        &self,
        purpose: &str,
        country: Option<&str>,
        explicit_rate_id: Option<VatRateId>,
        now: DateTime<Utc>,
        budget: &ReadBudget,
    ) -> Result<Option<VatResolution>, EngineError> {
        if let Some(rate_id) = explicit_rate_id {
            budget.check("explicit vat rate lookup")?;
            if let Some(rate) = self.store.vat_rate(rate_id)? {
                if rate.is_usable_at(now) {
                    return Ok(Some(VatResolution {
                        rate: Some(rate),
                        source: VatSource::ExplicitRate,
                    }));
                }
            }
            tracing::debug!(%rate_id, "explicit VAT rate not usable, resolving by rule");
        }

        if !purpose.trim().is_empty() {
            budget.check("vat rule lookup")?;
            let rules = self.store.vat_rules()?;
            for rule in candidate_rules(&rules, purpose, country, now) {
                budget.check("vat rate lookup")?;
                match self.store.vat_rate(rule.vat_rate_id)? {
                    Some(rate) if rate.is_usable_at(now) => {
                        return Ok(Some(VatResolution {
                            rate: Some(rate),
                            source: VatSource::Rule(rule.id),
                        }));
                    }
                    _ => {
                        tracing::debug!(
                            rule_id = %rule.id,
                            vat_rate_id = %rule.vat_rate_id,
                            "VAT rule references an unusable rate"
                        );
                    }
                }
            }
        }

        if let Some(hard) = self
            .config
            .hard_default
            .as_ref()
            .filter(|h| h.applies_to(purpose, country))
        {
            budget.check("hard default vat lookup")?;
            if let Some(rate) = self.store.vat_rate_by_code(&hard.vat_code)? {
                if rate.is_usable_at(now) {
                    return Ok(Some(VatResolution {
                        rate: Some(rate),
                        source: VatSource::HardDefault,
                    }));
                }
            }
        }

        Ok(None)
    }

    fn fall_back(
        &self,
        source: VatSource,
        purpose: &str,
        country: Option<&str>,
        cause: Option<&EngineError>,
    ) -> VatResolution {
        let error = cause.map(ToString::to_string);
        tracing::warn!(
            purpose,
            country = country.unwrap_or(""),
            source = source.as_str(),
            error = error.as_deref().unwrap_or(""),
            "no usable VAT rate, applying 0%"
        );
        metrics::counter!(VAT_FALLBACK_COUNTER, "source" => source.as_str()).increment(1);
        VatResolution { rate: None, source }
    }
}

impl std::fmt::Debug for TaxRuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxRuleResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Applicable rules, best candidate first.
fn candidate_rules<'a>(
    rules: &'a [VatRule],
    purpose: &str,
    country: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<&'a VatRule> {
    let mut ranked: Vec<(CountryMatch, &VatRule)> = rules
        .iter()
        .filter(|r| r.is_active && r.window.contains(now) && r.is_for_purpose(purpose))
        .filter_map(|r| r.country_match(country).map(|m| (m, r)))
        .collect();
    ranked.sort_by(|(ma, a), (mb, b)| {
        ma.cmp(mb)
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.into_iter().map(|(_, r)| r).collect()
}
