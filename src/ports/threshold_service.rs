//! Threshold service port: Trait for the remote bilirubin reference service.
//!
//! This trait abstracts the HTTP transport from the bilirubin use case, so the
//! fallback contract can be exercised without a network.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::domain::{BiliInputs, Thresholds};

/// Errors from a remote threshold lookup.
///
/// None of these reach callers of the bilirubin use case; every variant
/// degrades to the local table path.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ThresholdServiceError {
    #[error("Threshold service unreachable: {0}")]
    Network(String),

    #[error("Threshold service timed out after {0} ms")]
    Timeout(u64),

    #[error("Threshold service returned HTTP {0}")]
    Status(u16),

    #[error("Malformed threshold payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid threshold service URL: {0}")]
    InvalidUrl(String),
}

/// Risk-factor flag as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskParam {
    Any,
    None,
}

/// Query sent to the remote service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdQuery {
    /// Decimal gestational age in weeks.
    pub ga: f64,
    /// Age in whole hours.
    pub age: u32,
    /// TSB in mg/dL.
    pub bili: f64,
    pub risk: RiskParam,
}

impl ThresholdQuery {
    /// Build the query for `inputs` at an already-computed age.
    #[must_use]
    pub fn from_inputs(inputs: &BiliInputs, age_hours: f64) -> Self {
        let ga = (inputs.gestational_age.decimal_weeks() * 100.0).round() / 100.0;
        Self {
            ga,
            age: age_hours.max(0.0).round() as u32,
            bili: inputs.tsb,
            risk: if inputs.neurotoxicity_risk {
                RiskParam::Any
            } else {
                RiskParam::None
            },
        }
    }
}

/// Expected JSON body; extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdResponse {
    pub photo_threshold: f64,
    pub exchange_threshold: f64,
}

impl ThresholdResponse {
    /// Accept only finite, non-negative thresholds.
    ///
    /// # Errors
    /// Returns `ThresholdServiceError::MalformedPayload` otherwise.
    pub fn into_thresholds(self) -> Result<Thresholds, ThresholdServiceError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(self.photo_threshold) || !valid(self.exchange_threshold) {
            return Err(ThresholdServiceError::MalformedPayload(format!(
                "non-numeric or negative thresholds (photo={}, exchange={})",
                self.photo_threshold, self.exchange_threshold
            )));
        }
        Ok(Thresholds {
            photo: self.photo_threshold,
            exchange: self.exchange_threshold,
        })
    }
}

/// Trait for remote threshold lookups.
///
/// Implementations should bound their own request time, but callers still
/// wrap every call in a timeout.
pub trait ThresholdService: Send + Sync {
    /// Fetch phototherapy and exchange thresholds.
    ///
    /// # Errors
    /// Returns a `ThresholdServiceError` for any transport, status or payload
    /// failure.
    fn fetch_thresholds(
        &self,
        query: &ThresholdQuery,
    ) -> impl Future<Output = Result<Thresholds, ThresholdServiceError>> + Send;
}
