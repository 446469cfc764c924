//! # NeoRisk
//!
//! Neonatal risk calculators for the first days of life.
//!
//! This crate provides:
//! - Early-onset sepsis (EOS) risk per 1000 live births, at birth and after the
//!   clinical exam, with a four-tier management recommendation
//! - Gestational-age and age-in-hours specific bilirubin phototherapy and
//!   exchange thresholds, from a remote service with local table fallback
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Coefficient sets, risk engine, recommendation tiers, threshold tables
//! - `ports`: Trait for the remote threshold service
//! - `adapters`: reqwest client and log redaction
//! - `application`: Use cases and the generation-tracked bilirubin session
//! - `config`: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{calculate_bili_local, calculate_eos, BiliService, BiliSession, EosService};
pub use config::EngineConfig;
pub use domain::{BiliInputs, BiliOutputs, EosInputs, EosOutputs, ModelVersion};

/// Result type for NeoRisk operations
pub type Result<T> = std::result::Result<T, NeoRiskError>;

/// Main error type for NeoRisk
#[derive(Debug, thiserror::Error)]
pub enum NeoRiskError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(
        "Invalid recommendation thresholds: require 0 <= routine ({routine_max}) < enhanced ({enhanced_max}) < labs ({labs_max})"
    )]
    InvalidThresholds {
        routine_max: f64,
        enhanced_max: f64,
        labs_max: f64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Threshold service error: {0}")]
    Remote(#[from] ports::ThresholdServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_converts() {
        let err: NeoRiskError = ports::ThresholdServiceError::Status(502).into();
        assert!(matches!(
            err,
            NeoRiskError::Remote(ports::ThresholdServiceError::Status(502))
        ));
        assert_eq!(
            err.to_string(),
            "Threshold service error: Threshold service returned HTTP 502"
        );
    }
}
