//! Early-onset sepsis (EOS) input and output types.
//!
//! Categorical inputs are closed enums so that every coefficient lookup is an
//! exhaustive `match`. Labels accepted by `FromStr` mirror the ones used by the
//! reference neonatal sepsis calculator.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::recommendation::RecommendationCode;
use crate::NeoRiskError;

/// Which calibrated coefficient set to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVersion {
    /// 2017 model
    V1,
    /// 2024 model
    V2,
}

impl ModelVersion {
    /// Year label of the published model.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::V1 => "2017",
            Self::V2 => "2024",
        }
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ModelVersion {
    type Err = NeoRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "2017" => Ok(Self::V1),
            "v2" | "2024" => Ok(Self::V2),
            other => Err(NeoRiskError::Validation(format!(
                "Unknown model version '{other}' (expected 2017 or 2024)"
            ))),
        }
    }
}

/// Maternal Group B Streptococcus colonization status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GbsStatus {
    Positive,
    Negative,
    Unknown,
}

impl FromStr for GbsStatus {
    type Err = NeoRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" => Ok(Self::Positive),
            "negative" | "neg" => Ok(Self::Negative),
            "unknown" => Ok(Self::Unknown),
            other => Err(NeoRiskError::Validation(format!(
                "Unknown GBS status '{other}'"
            ))),
        }
    }
}

/// Intrapartum antibiotic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntibioticType {
    None,
    GbsSpecific,
    BroadSpectrum,
}

impl FromStr for AntibioticType {
    type Err = NeoRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "none" => Ok(Self::None),
            "gbs specific" | "gbs" => Ok(Self::GbsSpecific),
            "broad spectrum" | "broad" => Ok(Self::BroadSpectrum),
            other => Err(NeoRiskError::Validation(format!(
                "Unknown antibiotic type '{other}'"
            ))),
        }
    }
}

/// Time from first intrapartum antibiotic dose to delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntibioticDuration {
    None,
    UnderTwoHours,
    TwoToFourHours,
    FourHoursOrMore,
}

impl FromStr for AntibioticDuration {
    type Err = NeoRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "<2h" | "lt2" | "under2" => Ok(Self::UnderTwoHours),
            "2-4h" | "2to4" => Ok(Self::TwoToFourHours),
            ">=4h" | "4+" | "ge4" => Ok(Self::FourHoursOrMore),
            other => Err(NeoRiskError::Validation(format!(
                "Unknown antibiotic duration '{other}' (expected none, <2h, 2-4h, >=4h)"
            ))),
        }
    }
}

/// Newborn clinical presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalExam {
    Well,
    Equivocal,
    Ill,
}

impl FromStr for ClinicalExam {
    type Err = NeoRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "well" | "well appearing" => Ok(Self::Well),
            "equivocal" => Ok(Self::Equivocal),
            "ill" | "clinical illness" => Ok(Self::Ill),
            other => Err(NeoRiskError::Validation(format!(
                "Unknown clinical exam '{other}'"
            ))),
        }
    }
}

/// Gestational age as completed weeks plus days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestationalAge {
    pub weeks: u32,
    /// 0-6
    pub days: u32,
}

impl GestationalAge {
    #[must_use]
    pub fn new(weeks: u32, days: u32) -> Self {
        Self { weeks, days }
    }

    /// Decimal weeks (`weeks + days / 7`).
    #[must_use]
    pub fn decimal_weeks(&self) -> f64 {
        f64::from(self.weeks) + f64::from(self.days) / 7.0
    }
}

/// Highest maternal intrapartum temperature, stored in Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    fahrenheit: f64,
}

impl Temperature {
    #[must_use]
    pub fn fahrenheit(value: f64) -> Self {
        Self { fahrenheit: value }
    }

    #[must_use]
    pub fn celsius(value: f64) -> Self {
        Self {
            fahrenheit: value * 9.0 / 5.0 + 32.0,
        }
    }

    #[must_use]
    pub fn as_fahrenheit(&self) -> f64 {
        self.fahrenheit
    }
}

/// Inputs to the EOS calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosInputs {
    pub gestational_age: GestationalAge,
    pub maternal_temperature: Temperature,
    /// Rupture of membranes duration in hours.
    pub rom_hours: f64,
    pub gbs_status: GbsStatus,
    pub antibiotic_type: AntibioticType,
    pub antibiotic_duration: AntibioticDuration,
    pub clinical_exam: ClinicalExam,
    /// Local EOS incidence per 1000 live births.
    pub baseline_incidence: f64,
    pub model_version: ModelVersion,
}

/// Prior and posterior risk, both per 1000 live births.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskEstimate {
    pub risk_at_birth: f64,
    pub risk_posterior: f64,
}

/// Full EOS calculation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EosOutputs {
    pub risk_at_birth: f64,
    pub risk_posterior: f64,
    pub recommendation_code: RecommendationCode,
    pub recommendation_text: String,
    pub model_version: ModelVersion,
}
