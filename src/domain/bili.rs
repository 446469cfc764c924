//! Bilirubin threshold types and the local (table) resolution path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::eos::GestationalAge;
use super::round_dp;
use super::threshold_tables::ThresholdTables;

/// Inputs to the bilirubin threshold calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiliInputs {
    pub gestational_age: GestationalAge,
    pub birth_time: DateTime<Utc>,
    pub sample_time: DateTime<Utc>,
    /// Total serum bilirubin in mg/dL.
    pub tsb: f64,
    /// Any neurotoxicity risk factor present.
    pub neurotoxicity_risk: bool,
}

impl BiliInputs {
    /// Age at sampling in hours, rounded to 0.1 h. A sample taken before the
    /// recorded birth time yields 0.
    #[must_use]
    pub fn age_hours(&self) -> f64 {
        let millis = (self.sample_time - self.birth_time).num_milliseconds();
        let hours = round_dp(millis as f64 / 3_600_000.0, 1);
        hours.max(0.0)
    }
}

/// Where the thresholds came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Remote,
    LocalTable,
}

/// Phototherapy and exchange thresholds in mg/dL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub photo: f64,
    pub exchange: f64,
}

/// Follow-up guidance derived from the distance to the phototherapy threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupGuidance {
    /// delta >= 0
    StartPhototherapy,
    /// -2 <= delta < 0
    ApproachingThreshold,
    /// -4 <= delta < -2, younger than 48 h
    RecheckIn8To12Hours,
    /// -4 <= delta < -2, 48 h or older
    RecheckIn12To24Hours,
    /// delta < -4, younger than 24 h
    RecheckBeforeDischarge,
    /// delta < -4, 24 h or older
    RoutineFollowup,
}

impl FollowupGuidance {
    /// Select guidance from the TSB-minus-threshold delta and the age in hours.
    #[must_use]
    pub fn from_delta(delta_to_photo: f64, age_hours: f64) -> Self {
        if delta_to_photo >= 0.0 {
            Self::StartPhototherapy
        } else if delta_to_photo >= -2.0 {
            Self::ApproachingThreshold
        } else if delta_to_photo >= -4.0 {
            if age_hours < 48.0 {
                Self::RecheckIn8To12Hours
            } else {
                Self::RecheckIn12To24Hours
            }
        } else if age_hours < 24.0 {
            Self::RecheckBeforeDischarge
        } else {
            Self::RoutineFollowup
        }
    }

    #[must_use]
    pub fn text(&self) -> &'static str {
        match self {
            Self::StartPhototherapy => {
                "At or above phototherapy threshold: initiate phototherapy, recheck TSB in 4-6 hours"
            }
            Self::ApproachingThreshold => {
                "Approaching phototherapy threshold: recheck TSB in 4-6 hours"
            }
            Self::RecheckIn8To12Hours => "Below phototherapy threshold: recheck TSB in 8-12 hours",
            Self::RecheckIn12To24Hours => "Below phototherapy threshold: recheck TSB in 12-24 hours",
            Self::RecheckBeforeDischarge => {
                "Well below phototherapy threshold: routine care, consider TSB recheck before discharge"
            }
            Self::RoutineFollowup => {
                "Well below phototherapy threshold: routine follow-up per discharge timing"
            }
        }
    }
}

impl std::fmt::Display for FollowupGuidance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Result of a bilirubin threshold calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiliOutputs {
    /// Total serum bilirubin the thresholds were compared against.
    pub tsb: f64,
    pub photo_threshold: f64,
    pub exchange_threshold: f64,
    /// TSB minus phototherapy threshold, 1 decimal.
    pub delta_to_photo: f64,
    pub followup: FollowupGuidance,
    pub followup_guidance: String,
    /// Remote thresholds were requested but the service was unavailable.
    pub is_fallback: bool,
    pub source: ThresholdSource,
    pub age_hours: f64,
}

impl BiliOutputs {
    /// Derive delta and guidance from resolved thresholds.
    #[must_use]
    pub fn from_thresholds(
        inputs: &BiliInputs,
        age_hours: f64,
        thresholds: Thresholds,
        source: ThresholdSource,
        is_fallback: bool,
    ) -> Self {
        let delta_to_photo = round_dp(inputs.tsb - thresholds.photo, 1);
        let followup = FollowupGuidance::from_delta(delta_to_photo, age_hours);

        Self {
            tsb: inputs.tsb,
            photo_threshold: thresholds.photo,
            exchange_threshold: thresholds.exchange,
            delta_to_photo,
            followup,
            followup_guidance: followup.text().to_string(),
            is_fallback,
            source,
            age_hours,
        }
    }

    /// TSB at or above the exchange transfusion threshold.
    #[must_use]
    pub fn exceeds_exchange(&self) -> bool {
        self.tsb >= self.exchange_threshold
    }
}

/// Table thresholds for `inputs` at `age_hours`.
#[must_use]
pub fn local_thresholds(tables: &ThresholdTables, inputs: &BiliInputs, age_hours: f64) -> Thresholds {
    let (photo, exchange) = tables.pair(inputs.neurotoxicity_risk);
    let ga = inputs.gestational_age.weeks;

    Thresholds {
        photo: photo.value_at(ga, age_hours),
        exchange: exchange.value_at(ga, age_hours),
    }
}
