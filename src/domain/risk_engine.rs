//! EOS risk engine.
//!
//! Computes the prior risk at birth from the model's linear predictor,
//! rescales it to the local incidence in odds space, and applies the
//! clinical-exam likelihood ratio to obtain the posterior risk.

use super::eos::{EosInputs, RiskEstimate};
use super::model_params::ModelParameters;
use super::round_dp;

/// Incidence (per 1000 live births) the coefficient sets were fit against.
pub const CALIBRATION_INCIDENCE_PER_1000: f64 = 0.5;

/// Sum of all coefficient terms for `inputs` under `params`.
#[must_use]
pub fn linear_predictor(inputs: &EosInputs, params: &ModelParameters) -> f64 {
    let ga = params
        .gestational_age
        .coefficient(inputs.gestational_age.decimal_weeks());
    let temp = params
        .temperature
        .coefficient(inputs.maternal_temperature.as_fahrenheit());
    let rom = params.rom.coefficient(inputs.rom_hours);
    let gbs = params.gbs.coefficient(inputs.gbs_status);
    let abx = params
        .antibiotics
        .coefficient(inputs.antibiotic_type, inputs.antibiotic_duration);

    tracing::debug!(
        "EOS terms ({}): intercept={:.4} ga={:.4} temp={:.4} rom={:.4} gbs={:.4} abx={:.4}",
        params.version,
        params.intercept,
        ga,
        temp,
        rom,
        gbs,
        abx
    );

    params.intercept + ga + temp + rom + gbs + abx
}

/// Logistic function.
#[must_use]
pub fn logistic(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

fn to_odds(probability: f64) -> f64 {
    let p = probability.clamp(0.0, 1.0);
    p / (1.0 - p)
}

fn from_odds(odds: f64) -> f64 {
    // inf * 0 from a zero target incidence on a certain prior
    if odds.is_nan() {
        return 0.0;
    }
    if odds.is_infinite() {
        return 1.0;
    }
    (odds / (1.0 + odds)).clamp(0.0, 1.0)
}

/// Shift `probability` from the calibration incidence to a target incidence.
///
/// Scales the odds by `target / calibration`, which keeps the model's
/// odds ratios intact.
#[must_use]
pub fn recalibrate(probability: f64, target_incidence: f64, calibration_incidence: f64) -> f64 {
    let ratio = if calibration_incidence > 0.0 {
        (target_incidence / calibration_incidence).max(0.0)
    } else {
        1.0
    };
    from_odds(to_odds(probability) * ratio)
}

/// Apply a likelihood ratio to a pre-test probability.
#[must_use]
pub fn apply_likelihood_ratio(probability: f64, likelihood_ratio: f64) -> f64 {
    from_odds(to_odds(probability) * likelihood_ratio.max(0.0))
}

/// Prior and posterior risk per 1000 live births, rounded to two decimals.
#[must_use]
pub fn compute_risk(
    inputs: &EosInputs,
    params: &ModelParameters,
    calibration_incidence: f64,
) -> RiskEstimate {
    let logit = linear_predictor(inputs, params);
    let uncalibrated = logistic(logit);
    let prior = recalibrate(uncalibrated, inputs.baseline_incidence, calibration_incidence);
    let posterior = apply_likelihood_ratio(prior, params.exam.ratio(inputs.clinical_exam));

    RiskEstimate {
        risk_at_birth: round_dp(prior * 1000.0, 2),
        risk_posterior: round_dp(posterior * 1000.0, 2),
    }
}
