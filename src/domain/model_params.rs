//! Versioned EOS coefficient sets.
//!
//! One immutable instance exists per [`ModelVersion`]. Each set is expressed
//! in the additive-logit form: every risk factor contributes a term to the
//! linear predictor, calibrated against an incidence of 0.5 per 1000 live
//! births. The two sets are independent; nothing is shared or interpolated
//! between them.
//!
//! Temperature boundaries are in degrees Fahrenheit. Gestational-age buckets
//! are half-open `[min, max)` ranges in decimal weeks.

use super::eos::{AntibioticDuration, AntibioticType, ClinicalExam, GbsStatus, ModelVersion};

/// Gestational-age bucket, `[min_weeks, max_weeks)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaBucket {
    pub min_weeks: f64,
    pub max_weeks: f64,
    pub coefficient: f64,
}

/// Gestational-age term.
///
/// Below the lowest bucket the coefficient keeps rising by
/// `below_range_slope` per week, which is steeper than the step between the
/// two lowest buckets. Above the highest bucket the highest coefficient is
/// held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaTerm {
    pub buckets: &'static [GaBucket],
    pub below_range_slope: f64,
}

impl GaTerm {
    #[must_use]
    pub fn coefficient(&self, decimal_weeks: f64) -> f64 {
        let (Some(lowest), Some(highest)) = (self.buckets.first(), self.buckets.last()) else {
            return 0.0;
        };

        if decimal_weeks < lowest.min_weeks {
            return lowest.coefficient + self.below_range_slope * (lowest.min_weeks - decimal_weeks);
        }

        self.buckets
            .iter()
            .find(|b| decimal_weeks >= b.min_weeks && decimal_weeks < b.max_weeks)
            .map_or(highest.coefficient, |b| b.coefficient)
    }
}

/// Temperature step: applies to temperatures up to and including `upper_fahrenheit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureStep {
    pub upper_fahrenheit: f64,
    pub coefficient: f64,
}

/// Maternal temperature term over ascending boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureTerm {
    pub steps: &'static [TemperatureStep],
}

impl TemperatureTerm {
    /// Coefficient of the first boundary `>= fahrenheit`, or of the last
    /// boundary when the temperature exceeds them all.
    #[must_use]
    pub fn coefficient(&self, fahrenheit: f64) -> f64 {
        self.steps
            .iter()
            .find(|s| fahrenheit <= s.upper_fahrenheit)
            .or_else(|| self.steps.last())
            .map_or(0.0, |s| s.coefficient)
    }
}

/// Rupture-of-membranes term: linear beyond a threshold, flat below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RomTerm {
    pub threshold_hours: f64,
    pub slope_per_hour: f64,
}

impl RomTerm {
    #[must_use]
    pub fn coefficient(&self, rom_hours: f64) -> f64 {
        if rom_hours <= self.threshold_hours {
            0.0
        } else {
            (rom_hours - self.threshold_hours) * self.slope_per_hour
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbsCoefficients {
    pub positive: f64,
    pub negative: f64,
    pub unknown: f64,
}

impl GbsCoefficients {
    #[must_use]
    pub fn coefficient(&self, status: GbsStatus) -> f64 {
        match status {
            GbsStatus::Positive => self.positive,
            GbsStatus::Negative => self.negative,
            GbsStatus::Unknown => self.unknown,
        }
    }
}

/// Antibiotic coefficients for one antibiotic class, by exposure duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationCoefficients {
    pub under_two_hours: f64,
    pub two_to_four_hours: f64,
    pub four_hours_or_more: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntibioticCoefficients {
    pub gbs_specific: DurationCoefficients,
    pub broad_spectrum: DurationCoefficients,
}

impl AntibioticCoefficients {
    /// Zero when no antibiotic was given or no duration is recorded.
    #[must_use]
    pub fn coefficient(&self, kind: AntibioticType, duration: AntibioticDuration) -> f64 {
        let by_duration = match kind {
            AntibioticType::None => return 0.0,
            AntibioticType::GbsSpecific => &self.gbs_specific,
            AntibioticType::BroadSpectrum => &self.broad_spectrum,
        };

        match duration {
            AntibioticDuration::None => 0.0,
            AntibioticDuration::UnderTwoHours => by_duration.under_two_hours,
            AntibioticDuration::TwoToFourHours => by_duration.two_to_four_hours,
            AntibioticDuration::FourHoursOrMore => by_duration.four_hours_or_more,
        }
    }
}

/// Likelihood ratios applied to the prior odds for each exam category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExamLikelihoodRatios {
    pub well: f64,
    pub equivocal: f64,
    pub ill: f64,
}

impl ExamLikelihoodRatios {
    #[must_use]
    pub fn ratio(&self, exam: ClinicalExam) -> f64 {
        match exam {
            ClinicalExam::Well => self.well,
            ClinicalExam::Equivocal => self.equivocal,
            ClinicalExam::Ill => self.ill,
        }
    }
}

/// Complete coefficient bundle for one model version.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParameters {
    pub version: ModelVersion,
    pub intercept: f64,
    pub gestational_age: GaTerm,
    pub temperature: TemperatureTerm,
    pub rom: RomTerm,
    pub gbs: GbsCoefficients,
    pub antibiotics: AntibioticCoefficients,
    pub exam: ExamLikelihoodRatios,
}

impl ModelParameters {
    /// Coefficient set for `version`.
    #[must_use]
    pub fn for_version(version: ModelVersion) -> &'static ModelParameters {
        match version {
            ModelVersion::V1 => &MODEL_2017,
            ModelVersion::V2 => &MODEL_2024,
        }
    }
}

/// ROM hours before the linear term starts accruing.
pub const ROM_THRESHOLD_HOURS: f64 = 18.0;

// === 2017 model ===

const GA_BUCKETS_2017: [GaBucket; 9] = [
    GaBucket { min_weeks: 34.0, max_weeks: 35.0, coefficient: 2.45 },
    GaBucket { min_weeks: 35.0, max_weeks: 36.0, coefficient: 1.62 },
    GaBucket { min_weeks: 36.0, max_weeks: 37.0, coefficient: 0.98 },
    GaBucket { min_weeks: 37.0, max_weeks: 38.0, coefficient: 0.52 },
    GaBucket { min_weeks: 38.0, max_weeks: 39.0, coefficient: 0.21 },
    GaBucket { min_weeks: 39.0, max_weeks: 40.0, coefficient: 0.05 },
    GaBucket { min_weeks: 40.0, max_weeks: 41.0, coefficient: 0.0 },
    GaBucket { min_weeks: 41.0, max_weeks: 42.0, coefficient: 0.12 },
    GaBucket { min_weeks: 42.0, max_weeks: 43.0, coefficient: 0.40 },
];

const TEMPERATURE_STEPS_2017: [TemperatureStep; 17] = [
    TemperatureStep { upper_fahrenheit: 96.0, coefficient: -1.736 },
    TemperatureStep { upper_fahrenheit: 96.5, coefficient: -1.302 },
    TemperatureStep { upper_fahrenheit: 97.0, coefficient: -0.868 },
    TemperatureStep { upper_fahrenheit: 97.5, coefficient: -0.434 },
    TemperatureStep { upper_fahrenheit: 98.0, coefficient: 0.0 },
    TemperatureStep { upper_fahrenheit: 98.5, coefficient: 0.434 },
    TemperatureStep { upper_fahrenheit: 99.0, coefficient: 0.868 },
    TemperatureStep { upper_fahrenheit: 99.5, coefficient: 1.302 },
    TemperatureStep { upper_fahrenheit: 100.0, coefficient: 1.736 },
    TemperatureStep { upper_fahrenheit: 100.5, coefficient: 2.170 },
    TemperatureStep { upper_fahrenheit: 101.0, coefficient: 2.604 },
    TemperatureStep { upper_fahrenheit: 101.5, coefficient: 3.038 },
    TemperatureStep { upper_fahrenheit: 102.0, coefficient: 3.472 },
    TemperatureStep { upper_fahrenheit: 102.5, coefficient: 3.906 },
    TemperatureStep { upper_fahrenheit: 103.0, coefficient: 4.340 },
    TemperatureStep { upper_fahrenheit: 103.5, coefficient: 4.774 },
    TemperatureStep { upper_fahrenheit: 104.0, coefficient: 5.208 },
];

/// 2017 model. Unknown GBS status is close to negative.
pub static MODEL_2017: ModelParameters = ModelParameters {
    version: ModelVersion::V1,
    intercept: -10.8198,
    gestational_age: GaTerm {
        buckets: &GA_BUCKETS_2017,
        below_range_slope: 0.95,
    },
    temperature: TemperatureTerm {
        steps: &TEMPERATURE_STEPS_2017,
    },
    rom: RomTerm {
        threshold_hours: ROM_THRESHOLD_HOURS,
        slope_per_hour: 0.0165,
    },
    gbs: GbsCoefficients {
        positive: 0.5771,
        negative: 0.0,
        unknown: 0.0427,
    },
    antibiotics: AntibioticCoefficients {
        gbs_specific: DurationCoefficients {
            under_two_hours: 0.0,
            two_to_four_hours: -0.5,
            four_hours_or_more: -1.0488,
        },
        broad_spectrum: DurationCoefficients {
            under_two_hours: 0.0,
            two_to_four_hours: -1.0488,
            four_hours_or_more: -1.1861,
        },
    },
    exam: ExamLikelihoodRatios {
        well: 0.41,
        equivocal: 5.0,
        ill: 21.2,
    },
};

// === 2024 model ===

const GA_BUCKETS_2024: [GaBucket; 9] = [
    GaBucket { min_weeks: 34.0, max_weeks: 35.0, coefficient: 2.30 },
    GaBucket { min_weeks: 35.0, max_weeks: 36.0, coefficient: 1.55 },
    GaBucket { min_weeks: 36.0, max_weeks: 37.0, coefficient: 0.94 },
    GaBucket { min_weeks: 37.0, max_weeks: 38.0, coefficient: 0.50 },
    GaBucket { min_weeks: 38.0, max_weeks: 39.0, coefficient: 0.20 },
    GaBucket { min_weeks: 39.0, max_weeks: 40.0, coefficient: 0.04 },
    GaBucket { min_weeks: 40.0, max_weeks: 41.0, coefficient: 0.0 },
    GaBucket { min_weeks: 41.0, max_weeks: 42.0, coefficient: 0.10 },
    GaBucket { min_weeks: 42.0, max_weeks: 43.0, coefficient: 0.36 },
];

const TEMPERATURE_STEPS_2024: [TemperatureStep; 17] = [
    TemperatureStep { upper_fahrenheit: 96.0, coefficient: -1.64 },
    TemperatureStep { upper_fahrenheit: 96.5, coefficient: -1.23 },
    TemperatureStep { upper_fahrenheit: 97.0, coefficient: -0.82 },
    TemperatureStep { upper_fahrenheit: 97.5, coefficient: -0.41 },
    TemperatureStep { upper_fahrenheit: 98.0, coefficient: 0.0 },
    TemperatureStep { upper_fahrenheit: 98.5, coefficient: 0.41 },
    TemperatureStep { upper_fahrenheit: 99.0, coefficient: 0.82 },
    TemperatureStep { upper_fahrenheit: 99.5, coefficient: 1.23 },
    TemperatureStep { upper_fahrenheit: 100.0, coefficient: 1.64 },
    TemperatureStep { upper_fahrenheit: 100.5, coefficient: 2.05 },
    TemperatureStep { upper_fahrenheit: 101.0, coefficient: 2.46 },
    TemperatureStep { upper_fahrenheit: 101.5, coefficient: 2.87 },
    TemperatureStep { upper_fahrenheit: 102.0, coefficient: 3.28 },
    TemperatureStep { upper_fahrenheit: 102.5, coefficient: 3.69 },
    TemperatureStep { upper_fahrenheit: 103.0, coefficient: 4.10 },
    TemperatureStep { upper_fahrenheit: 103.5, coefficient: 4.51 },
    TemperatureStep { upper_fahrenheit: 104.0, coefficient: 4.92 },
];

/// 2024 model. Unknown GBS status carries most of the positive-status risk.
pub static MODEL_2024: ModelParameters = ModelParameters {
    version: ModelVersion::V2,
    intercept: -9.5670,
    gestational_age: GaTerm {
        buckets: &GA_BUCKETS_2024,
        below_range_slope: 0.90,
    },
    temperature: TemperatureTerm {
        steps: &TEMPERATURE_STEPS_2024,
    },
    rom: RomTerm {
        threshold_hours: ROM_THRESHOLD_HOURS,
        slope_per_hour: 0.0190,
    },
    gbs: GbsCoefficients {
        positive: 1.32,
        negative: 0.0,
        unknown: 1.05,
    },
    antibiotics: AntibioticCoefficients {
        gbs_specific: DurationCoefficients {
            under_two_hours: 0.0,
            two_to_four_hours: -0.45,
            four_hours_or_more: -0.96,
        },
        broad_spectrum: DurationCoefficients {
            under_two_hours: 0.0,
            two_to_four_hours: -0.98,
            four_hours_or_more: -1.25,
        },
    },
    exam: ExamLikelihoodRatios {
        well: 0.36,
        equivocal: 3.75,
        ill: 14.5,
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    fn all_models() -> [&'static ModelParameters; 2] {
        [
            ModelParameters::for_version(ModelVersion::V1),
            ModelParameters::for_version(ModelVersion::V2),
        ]
    }

    #[test]
    fn test_selection_by_version() {
        assert_eq!(ModelParameters::for_version(ModelVersion::V1).version, ModelVersion::V1);
        assert_eq!(ModelParameters::for_version(ModelVersion::V2).version, ModelVersion::V2);
    }

    #[test]
    fn test_ga_buckets_ordered_and_contiguous() {
        for model in all_models() {
            let buckets = model.gestational_age.buckets;
            for pair in buckets.windows(2) {
                assert!(pair[0].min_weeks < pair[0].max_weeks);
                assert!((pair[0].max_weeks - pair[1].min_weeks).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_ga_lookup_and_clamping() {
        let ga = &MODEL_2017.gestational_age;
        assert!((ga.coefficient(39.0 + 3.0 / 7.0) - 0.05).abs() < f64::EPSILON);
        assert!((ga.coefficient(40.0) - 0.0).abs() < f64::EPSILON);
        // above range holds the highest bucket
        assert!((ga.coefficient(44.0) - 0.40).abs() < f64::EPSILON);
        // below range is steeper than the lowest bucket
        let below = ga.coefficient(33.0);
        assert!(below > 2.45);
        assert!(below - 2.45 > 2.45 - 1.62);
    }

    #[test]
    fn test_temperature_boundaries() {
        let temp = &MODEL_2017.temperature;
        assert!((temp.coefficient(98.0) - 0.0).abs() < f64::EPSILON);
        // 98.2 rounds up to the 98.5 boundary
        assert!((temp.coefficient(98.2) - 0.434).abs() < f64::EPSILON);
        assert!((temp.coefficient(110.0) - 5.208).abs() < f64::EPSILON);
        assert!((temp.coefficient(90.0) + 1.736).abs() < f64::EPSILON);
    }

    #[test]
    fn test_temperature_steps_ascending() {
        for model in all_models() {
            for pair in model.temperature.steps.windows(2) {
                assert!(pair[0].upper_fahrenheit < pair[1].upper_fahrenheit);
                assert!(pair[0].coefficient <= pair[1].coefficient);
            }
        }
    }

    #[test]
    fn test_rom_term() {
        let rom = &MODEL_2017.rom;
        assert_eq!(rom.coefficient(0.0), 0.0);
        assert_eq!(rom.coefficient(18.0), 0.0);
        assert!((rom.coefficient(28.0) - 10.0 * 0.0165).abs() < 1e-12);
    }

    #[test]
    fn test_antibiotics_none_is_zero() {
        for model in all_models() {
            let abx = &model.antibiotics;
            assert_eq!(
                abx.coefficient(AntibioticType::None, AntibioticDuration::FourHoursOrMore),
                0.0
            );
            assert_eq!(abx.coefficient(AntibioticType::BroadSpectrum, AntibioticDuration::None), 0.0);
        }
    }

    #[test]
    fn test_gbs_unknown_diverges_between_versions() {
        assert!(MODEL_2017.gbs.unknown < 0.1);
        assert!(MODEL_2024.gbs.unknown > 0.9);
    }
}
