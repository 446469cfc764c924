//! Environment configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NEORISK_BILI_SERVICE_URL` | unset (remote lookups disabled) |
//! | `NEORISK_BILI_TIMEOUT_MS` | 3000 |
//! | `NEORISK_BASELINE_INCIDENCE` | 0.5 per 1000 |
//! | `NEORISK_ROUTINE_MAX` | 0.50 |
//! | `NEORISK_ENHANCED_MAX` | 1.00 |
//! | `NEORISK_LABS_MAX` | 3.00 |

use std::str::FromStr;
use std::time::Duration;

use crate::application::DEFAULT_REMOTE_TIMEOUT;
use crate::domain::{RecommendationThresholds, CALIBRATION_INCIDENCE_PER_1000};
use crate::{NeoRiskError, Result};

pub const BILI_SERVICE_URL_ENV: &str = "NEORISK_BILI_SERVICE_URL";
pub const BILI_TIMEOUT_MS_ENV: &str = "NEORISK_BILI_TIMEOUT_MS";
pub const BASELINE_INCIDENCE_ENV: &str = "NEORISK_BASELINE_INCIDENCE";
pub const ROUTINE_MAX_ENV: &str = "NEORISK_ROUTINE_MAX";
pub const ENHANCED_MAX_ENV: &str = "NEORISK_ENHANCED_MAX";
pub const LABS_MAX_ENV: &str = "NEORISK_LABS_MAX";

/// Engine settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bili_service_url: Option<String>,
    pub bili_timeout: Duration,
    pub baseline_incidence: f64,
    pub thresholds: RecommendationThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bili_service_url: None,
            bili_timeout: DEFAULT_REMOTE_TIMEOUT,
            baseline_incidence: CALIBRATION_INCIDENCE_PER_1000,
            thresholds: RecommendationThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// Returns `NeoRiskError::Config` for unparseable or out-of-range values,
    /// or `NeoRiskError::InvalidThresholds` for inconsistent tiers.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bili_service_url = lookup(BILI_SERVICE_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let bili_timeout = match parse::<u64>(&lookup, BILI_TIMEOUT_MS_ENV)? {
            Some(0) => {
                return Err(NeoRiskError::Config(format!(
                    "{BILI_TIMEOUT_MS_ENV} must be greater than zero"
                )))
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.bili_timeout,
        };

        let baseline_incidence =
            parse::<f64>(&lookup, BASELINE_INCIDENCE_ENV)?.unwrap_or(defaults.baseline_incidence);
        if !baseline_incidence.is_finite() || baseline_incidence <= 0.0 {
            return Err(NeoRiskError::Config(format!(
                "{BASELINE_INCIDENCE_ENV} must be a positive number, got {baseline_incidence}"
            )));
        }

        let thresholds = RecommendationThresholds::new(
            parse(&lookup, ROUTINE_MAX_ENV)?.unwrap_or(defaults.thresholds.routine_max()),
            parse(&lookup, ENHANCED_MAX_ENV)?.unwrap_or(defaults.thresholds.enhanced_max()),
            parse(&lookup, LABS_MAX_ENV)?.unwrap_or(defaults.thresholds.labs_max()),
        )?;

        tracing::debug!(
            "Configuration loaded (remote={}, timeout={:?}, incidence={})",
            bili_service_url.is_some(),
            bili_timeout,
            baseline_incidence
        );

        Ok(Self {
            bili_service_url,
            bili_timeout,
            baseline_incidence,
            thresholds,
        })
    }

    #[must_use]
    pub fn remote_enabled(&self) -> bool {
        self.bili_service_url.is_some()
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| NeoRiskError::Config(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).expect("Should load defaults");
        assert!(!config.remote_enabled());
        assert_eq!(config.bili_timeout, Duration::from_millis(3000));
        assert!((config.baseline_incidence - 0.5).abs() < 1e-12);
        assert!((config.thresholds.labs_max() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_reads_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (BILI_SERVICE_URL_ENV, " https://bili.example.org/api "),
            (BILI_TIMEOUT_MS_ENV, "750"),
            (BASELINE_INCIDENCE_ENV, "0.3"),
            (LABS_MAX_ENV, "2.5"),
        ]))
        .expect("Should load overrides");

        assert_eq!(
            config.bili_service_url.as_deref(),
            Some("https://bili.example.org/api")
        );
        assert_eq!(config.bili_timeout, Duration::from_millis(750));
        assert!((config.baseline_incidence - 0.3).abs() < 1e-12);
        assert!((config.thresholds.labs_max() - 2.5).abs() < 1e-12);
        assert!((config.thresholds.routine_max() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_blank_url_disables_remote() {
        let config = EngineConfig::from_lookup(lookup(&[(BILI_SERVICE_URL_ENV, "   ")]))
            .expect("Should load");
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_rejects_garbage_timeout() {
        let err = EngineConfig::from_lookup(lookup(&[(BILI_TIMEOUT_MS_ENV, "soon")]))
            .expect_err("Should reject");
        assert!(matches!(err, NeoRiskError::Config(_)));

        let err = EngineConfig::from_lookup(lookup(&[(BILI_TIMEOUT_MS_ENV, "0")]))
            .expect_err("Should reject zero");
        assert!(matches!(err, NeoRiskError::Config(_)));
    }

    #[test]
    fn test_rejects_non_positive_incidence() {
        let err = EngineConfig::from_lookup(lookup(&[(BASELINE_INCIDENCE_ENV, "-1")]))
            .expect_err("Should reject");
        assert!(matches!(err, NeoRiskError::Config(_)));
    }

    #[test]
    fn test_rejects_inverted_tiers() {
        let err = EngineConfig::from_lookup(lookup(&[
            (ROUTINE_MAX_ENV, "2.0"),
            (ENHANCED_MAX_ENV, "1.0"),
        ]))
        .expect_err("Should reject");
        assert!(matches!(err, NeoRiskError::InvalidThresholds { .. }));
    }
}
