//! Domain layer: Core clinical types and pure calculations.
//!
//! Nothing in this module performs I/O. Coefficient sets and threshold
//! tables are immutable shared data.

pub mod bili;
pub mod eos;
pub mod model_params;
pub mod recommendation;
pub mod risk_engine;
pub mod threshold_tables;

pub use bili::{BiliInputs, BiliOutputs, FollowupGuidance, ThresholdSource, Thresholds};
pub use eos::{
    AntibioticDuration, AntibioticType, ClinicalExam, EosInputs, EosOutputs, GbsStatus,
    GestationalAge, ModelVersion, RiskEstimate, Temperature,
};
pub use model_params::ModelParameters;
pub use recommendation::{classify, Recommendation, RecommendationCode, RecommendationThresholds};
pub use risk_engine::{compute_risk, CALIBRATION_INCIDENCE_PER_1000};
pub use threshold_tables::{ThresholdTable, ThresholdTables};

/// Round half away from zero to `decimals` places.
pub(crate) fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
