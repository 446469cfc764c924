//! EOS use case: risk estimate plus recommendation tier.
//!
//! Fully synchronous and free of shared mutable state.

use crate::domain::{
    classify, compute_risk, EosInputs, EosOutputs, ModelParameters, RecommendationThresholds,
    CALIBRATION_INCIDENCE_PER_1000,
};

/// Compute EOS risk and classify it.
///
/// Uses the default recommendation thresholds when `thresholds` is `None`.
#[must_use]
pub fn calculate_eos(
    inputs: &EosInputs,
    thresholds: Option<&RecommendationThresholds>,
) -> EosOutputs {
    let params = ModelParameters::for_version(inputs.model_version);
    let estimate = compute_risk(inputs, params, CALIBRATION_INCIDENCE_PER_1000);

    let default_thresholds = RecommendationThresholds::default();
    let recommendation = classify(
        estimate.risk_posterior,
        thresholds.unwrap_or(&default_thresholds),
    );

    tracing::info!(
        "EOS calculation complete: model={}, at_birth={:.2}/1000, posterior={:.2}/1000, tier={}",
        inputs.model_version,
        estimate.risk_at_birth,
        estimate.risk_posterior,
        recommendation.code
    );

    EosOutputs {
        risk_at_birth: estimate.risk_at_birth,
        risk_posterior: estimate.risk_posterior,
        recommendation_code: recommendation.code,
        recommendation_text: recommendation.text,
        model_version: inputs.model_version,
    }
}

/// EOS calculator bound to a site's recommendation thresholds.
#[derive(Debug, Clone, Default)]
pub struct EosService {
    thresholds: RecommendationThresholds,
}

impl EosService {
    #[must_use]
    pub fn new(thresholds: RecommendationThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &RecommendationThresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn calculate(&self, inputs: &EosInputs) -> EosOutputs {
        calculate_eos(inputs, Some(&self.thresholds))
    }
}
