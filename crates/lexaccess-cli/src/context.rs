//! Shared loading helpers for the subcommands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use lexaccess_core::{parse_utc, EngineConfig, ReadBudget, Snapshot};

/// Load engine configuration: the YAML file at `path` when given, otherwise
/// defaults, then environment overrides on top.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load configuration: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("failed to apply environment overrides")?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Load a state snapshot.
pub fn load_snapshot(path: &Path) -> Result<Arc<Snapshot>> {
    if !path.exists() {
        anyhow::bail!("snapshot file not found: {}", path.display());
    }
    let snapshot = Snapshot::from_path(path)
        .with_context(|| format!("failed to load snapshot: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        principals = snapshot.principals.len(),
        content_items = snapshot.content_items.len(),
        "snapshot loaded"
    );
    Ok(Arc::new(snapshot))
}

/// The evaluation instant: `at` when given, otherwise now.
pub fn resolve_instant(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(raw) => Ok(parse_utc(raw)?),
        None => Ok(Utc::now()),
    }
}

/// A read budget from an optional millisecond timeout.
pub fn read_budget(timeout_ms: Option<u64>) -> ReadBudget {
    match timeout_ms {
        Some(ms) => ReadBudget::with_timeout(Duration::from_millis(ms)),
        None => ReadBudget::unbounded(),
    }
}

/// Print `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("snapshot file not found"));
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexaccess.yaml");
        std::fs::write(&path, "access:\n  currency: UGX\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.access.currency, "UGX");
    }

    #[test]
    fn explicit_instant_is_parsed() {
        let at = resolve_instant(Some("2026-03-01T12:00:00+03:00")).unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-01T09:00:00+00:00");
        assert!(resolve_instant(Some("yesterday")).is_err());
    }

    #[test]
    fn zero_timeout_budget_is_spent() {
        assert!(read_budget(Some(0)).check("lookup").is_err());
        assert!(read_budget(None).check("lookup").is_ok());
    }
}
