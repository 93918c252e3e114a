//! # Temporal Types
//!
//! All instants in lexaccess are `chrono::DateTime<Utc>`. Local time is a
//! presentation concern of the caller.
//!
//! [`EffectiveWindow`] is the optional `[from, to]` range shared by VAT rates
//! and VAT rules. Both bounds are inclusive and either may be open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An inclusive, optionally open-ended validity window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveWindow {
    /// First instant the row is usable. `None` means "since forever".
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
    /// Last instant the row is usable. `None` means "until further notice".
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
}

impl EffectiveWindow {
    /// A window with both bounds open.
    pub const fn open() -> Self {
        Self {
            effective_from: None,
            effective_to: None,
        }
    }

    /// A window with explicit bounds.
    pub const fn between(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self {
            effective_from: from,
            effective_to: to,
        }
    }

    /// Whether `now` falls inside the window (bounds inclusive).
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let after_start = self.effective_from.map_or(true, |from| from <= now);
        let before_end = self.effective_to.map_or(true, |to| now <= to);
        after_start && before_end
    }
}

/// Parse an RFC 3339 timestamp and normalise it to UTC.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimestamp`] if the string is not
/// valid RFC 3339.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValidationError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
