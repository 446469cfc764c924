//! Recommendation tiers for the EOS posterior risk.
//!
//! Four tiers, each with fixed guidance text, selected by ascending cut-offs.
//! A value equal to a cut-off stays in the lower tier.

use serde::{Deserialize, Serialize};

use crate::NeoRiskError;

/// Action tier for a newborn at risk of early-onset sepsis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCode {
    /// Routine newborn care
    Routine,
    /// Enhanced clinical observation
    Enhanced,
    /// Blood culture plus enhanced observation
    Labs,
    /// Empiric antibiotics
    Empiric,
}

impl RecommendationCode {
    /// Clinical guidance for this tier.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Routine => "Routine care: no culture, no antibiotics, routine vital signs",
            Self::Enhanced => {
                "Enhanced observation: no culture, no antibiotics, vital signs every 4 hours for 24 hours"
            }
            Self::Labs => {
                "Blood culture and enhanced observation: vital signs every 4 hours for 24 hours"
            }
            Self::Empiric => "Empiric antibiotics: obtain blood culture and start antibiotics",
        }
    }
}

impl std::fmt::Display for RecommendationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Routine => write!(f, "ROUTINE"),
            Self::Enhanced => write!(f, "ENHANCED"),
            Self::Labs => write!(f, "LABS"),
            Self::Empiric => write!(f, "EMPIRIC"),
        }
    }
}

/// Upper bounds (inclusive, per 1000 live births) of the three lower tiers.
///
/// Always strictly ascending; [`RecommendationThresholds::new`] enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendationThresholds {
    routine_max: f64,
    enhanced_max: f64,
    labs_max: f64,
}

impl RecommendationThresholds {
    pub const DEFAULT_ROUTINE_MAX: f64 = 0.50;
    pub const DEFAULT_ENHANCED_MAX: f64 = 1.00;
    pub const DEFAULT_LABS_MAX: f64 = 3.00;

    /// Create thresholds.
    ///
    /// # Errors
    /// Returns `NeoRiskError::InvalidThresholds` unless
    /// `0 <= routine_max < enhanced_max < labs_max` and all are finite.
    pub fn new(routine_max: f64, enhanced_max: f64, labs_max: f64) -> Result<Self, NeoRiskError> {
        let finite = routine_max.is_finite() && enhanced_max.is_finite() && labs_max.is_finite();
        if !finite || routine_max < 0.0 || routine_max >= enhanced_max || enhanced_max >= labs_max {
            return Err(NeoRiskError::InvalidThresholds {
                routine_max,
                enhanced_max,
                labs_max,
            });
        }

        Ok(Self {
            routine_max,
            enhanced_max,
            labs_max,
        })
    }

    #[must_use]
    pub fn routine_max(&self) -> f64 {
        self.routine_max
    }

    #[must_use]
    pub fn enhanced_max(&self) -> f64 {
        self.enhanced_max
    }

    #[must_use]
    pub fn labs_max(&self) -> f64 {
        self.labs_max
    }
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            routine_max: Self::DEFAULT_ROUTINE_MAX,
            enhanced_max: Self::DEFAULT_ENHANCED_MAX,
            labs_max: Self::DEFAULT_LABS_MAX,
        }
    }
}

/// Tier plus its guidance text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub code: RecommendationCode,
    pub text: String,
}

/// Classify a posterior risk (per 1000) into a tier.
#[must_use]
pub fn classify(risk_posterior: f64, thresholds: &RecommendationThresholds) -> Recommendation {
    let code = if risk_posterior <= thresholds.routine_max {
        RecommendationCode::Routine
    } else if risk_posterior <= thresholds.enhanced_max {
        RecommendationCode::Enhanced
    } else if risk_posterior <= thresholds.labs_max {
        RecommendationCode::Labs
    } else {
        RecommendationCode::Empiric
    };

    Recommendation {
        code,
        text: code.description().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_classify_tiers() {
        let t = RecommendationThresholds::default();
        assert_eq!(classify(0.0, &t).code, RecommendationCode::Routine);
        assert_eq!(classify(0.8, &t).code, RecommendationCode::Enhanced);
        assert_eq!(classify(2.0, &t).code, RecommendationCode::Labs);
        assert_eq!(classify(12.5, &t).code, RecommendationCode::Empiric);
    }

    #[test]
    fn test_boundaries_belong_to_lower_tier() {
        let t = RecommendationThresholds::default();
        assert_eq!(classify(0.50, &t).code, RecommendationCode::Routine);
        assert_eq!(classify(0.50 + EPS, &t).code, RecommendationCode::Enhanced);
        assert_eq!(classify(1.00, &t).code, RecommendationCode::Enhanced);
        assert_eq!(classify(1.00 + EPS, &t).code, RecommendationCode::Labs);
        assert_eq!(classify(3.00, &t).code, RecommendationCode::Labs);
        assert_eq!(classify(3.00 + EPS, &t).code, RecommendationCode::Empiric);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = RecommendationThresholds::new(1.0, 2.0, 5.0).expect("Should accept ascending");
        assert_eq!(classify(1.0, &t).code, RecommendationCode::Routine);
        assert_eq!(classify(4.0, &t).code, RecommendationCode::Labs);
    }

    #[test]
    fn test_rejects_non_ascending_thresholds() {
        assert!(RecommendationThresholds::new(1.0, 1.0, 3.0).is_err());
        assert!(RecommendationThresholds::new(0.5, 3.0, 1.0).is_err());
        assert!(RecommendationThresholds::new(-0.1, 1.0, 3.0).is_err());
        assert!(RecommendationThresholds::new(0.5, f64::NAN, 3.0).is_err());
    }

    #[test]
    fn test_text_matches_code() {
        let r = classify(5.0, &RecommendationThresholds::default());
        assert_eq!(r.text, RecommendationCode::Empiric.description());
    }
}
