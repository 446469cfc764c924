//! Hour-indexed bilirubin threshold tables (mg/dL).
//!
//! Four static tables: phototherapy and exchange transfusion, each with and
//! without neurotoxicity risk factors. Every table maps a minimum
//! gestational-age bucket (completed weeks) to one threshold per integer hour
//! of age from birth to 14 days.
//!
//! Per-hour values are expanded once, on first use, from curve anchor points
//! by linear interpolation and rounded to 0.1 mg/dL. The anchors approximate
//! the 2022 AAP hyperbilirubinemia nomograms; after 120 hours each curve is
//! flat.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::round_dp;

/// Last hour covered by every table (14 days).
pub const MAX_TABLE_HOUR: usize = 336;

/// Hours at which anchor values are given.
const ANCHOR_HOURS: [usize; 7] = [0, 12, 24, 48, 72, 96, 120];

type Anchors = [f64; 7];

const PHOTO_NO_RISK: [(u32, Anchors); 6] = [
    (35, [5.8, 8.0, 10.5, 13.6, 15.7, 17.2, 18.0]),
    (36, [6.2, 8.5, 11.0, 14.2, 16.4, 18.0, 18.8]),
    (37, [6.6, 9.0, 11.5, 14.7, 17.0, 18.7, 19.6]),
    (38, [7.0, 9.4, 12.0, 15.3, 17.7, 19.4, 20.3]),
    (39, [7.4, 9.8, 12.4, 15.8, 18.3, 20.1, 21.0]),
    (40, [7.8, 10.2, 12.8, 16.2, 18.8, 20.6, 21.6]),
];

const PHOTO_WITH_RISK: [(u32, Anchors); 4] = [
    (35, [4.2, 6.2, 8.4, 11.0, 12.8, 14.1, 14.8]),
    (36, [4.6, 6.6, 8.9, 11.6, 13.6, 15.0, 15.7]),
    (37, [5.0, 7.0, 9.4, 12.2, 14.3, 15.8, 16.6]),
    (38, [5.4, 7.5, 9.9, 12.8, 15.0, 16.6, 17.4]),
];

const EXCHANGE_NO_RISK: [(u32, Anchors); 4] = [
    (35, [13.0, 14.8, 16.8, 19.0, 20.6, 21.6, 22.2]),
    (36, [13.6, 15.4, 17.5, 19.8, 21.4, 22.4, 23.0]),
    (37, [14.2, 16.1, 18.2, 20.6, 22.3, 23.3, 23.9]),
    (38, [14.8, 16.8, 19.0, 21.5, 23.2, 24.2, 24.8]),
];

const EXCHANGE_WITH_RISK: [(u32, Anchors); 4] = [
    (35, [10.8, 12.4, 14.2, 16.3, 17.8, 18.7, 19.2]),
    (36, [11.3, 13.0, 14.9, 17.0, 18.5, 19.5, 20.0]),
    (37, [11.8, 13.5, 15.5, 17.7, 19.3, 20.3, 20.9]),
    (38, [12.3, 14.1, 16.2, 18.4, 20.1, 21.1, 21.7]),
];

/// One threshold table: GA bucket key -> per-hour thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    buckets: BTreeMap<u32, Vec<f64>>,
}

impl ThresholdTable {
    fn from_anchors(rows: &[(u32, Anchors)]) -> Self {
        let buckets = rows
            .iter()
            .map(|(ga, anchors)| (*ga, expand_anchors(anchors)))
            .collect();
        Self { buckets }
    }

    /// Bucket key and hourly values for a gestational age in completed weeks.
    ///
    /// Picks the greatest key `<= ga_weeks`; younger infants get the lowest
    /// bucket.
    #[must_use]
    pub fn bucket(&self, ga_weeks: u32) -> Option<(u32, &[f64])> {
        self.buckets
            .range(..=ga_weeks)
            .next_back()
            .or_else(|| self.buckets.iter().next())
            .map(|(key, values)| (*key, values.as_slice()))
    }

    /// Threshold at `round(age_hours)`, clamped to the table's first and last hour.
    #[must_use]
    pub fn value_at(&self, ga_weeks: u32, age_hours: f64) -> f64 {
        let Some((_, values)) = self.bucket(ga_weeks) else {
            return 0.0;
        };
        let index = if age_hours.is_finite() && age_hours > 0.0 {
            age_hours.round() as usize
        } else {
            0
        };
        values
            .get(index)
            .or_else(|| values.last())
            .copied()
            .unwrap_or(0.0)
    }

    /// Bucket keys in ascending order.
    pub fn bucket_keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.buckets.keys().copied()
    }
}

fn expand_anchors(anchors: &Anchors) -> Vec<f64> {
    (0..=MAX_TABLE_HOUR)
        .map(|hour| {
            let segment = ANCHOR_HOURS
                .windows(2)
                .zip(anchors.windows(2))
                .find(|(hours, _)| hour <= hours[1]);

            let value = match segment {
                Some((hours, values)) => {
                    let span = (hours[1] - hours[0]) as f64;
                    let t = (hour.saturating_sub(hours[0])) as f64 / span;
                    values[0] + (values[1] - values[0]) * t
                }
                None => anchors[anchors.len() - 1],
            };
            round_dp(value, 1)
        })
        .collect()
}

/// The four threshold tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTables {
    pub photo_no_risk: ThresholdTable,
    pub photo_with_risk: ThresholdTable,
    pub exchange_no_risk: ThresholdTable,
    pub exchange_with_risk: ThresholdTable,
}

static STANDARD_TABLES: OnceLock<ThresholdTables> = OnceLock::new();

impl ThresholdTables {
    /// Shared, immutable standard tables.
    #[must_use]
    pub fn standard() -> &'static ThresholdTables {
        STANDARD_TABLES.get_or_init(|| ThresholdTables {
            photo_no_risk: ThresholdTable::from_anchors(&PHOTO_NO_RISK),
            photo_with_risk: ThresholdTable::from_anchors(&PHOTO_WITH_RISK),
            exchange_no_risk: ThresholdTable::from_anchors(&EXCHANGE_NO_RISK),
            exchange_with_risk: ThresholdTable::from_anchors(&EXCHANGE_WITH_RISK),
        })
    }

    /// (phototherapy, exchange) tables for the given risk flag.
    #[must_use]
    pub fn pair(&self, neurotoxicity_risk: bool) -> (&ThresholdTable, &ThresholdTable) {
        if neurotoxicity_risk {
            (&self.photo_with_risk, &self.exchange_with_risk)
        } else {
            (&self.photo_no_risk, &self.exchange_no_risk)
        }
    }
}
