//! Bilirubin use case: resolve thresholds and derive follow-up guidance.
//!
//! Remote thresholds take precedence when requested. Every remote failure
//! (transport, status, payload or timeout) degrades to the local tables and
//! is reported only through `BiliOutputs::is_fallback`.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::bili::local_thresholds;
use crate::domain::{BiliInputs, BiliOutputs, ThresholdSource, ThresholdTables};
use crate::ports::{ThresholdQuery, ThresholdService};

/// Default bound on a remote lookup, applied on top of the adapter's own.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(3);

/// Table-only calculation. Never touches the network.
#[must_use]
pub fn calculate_bili_local(inputs: &BiliInputs) -> BiliOutputs {
    resolve_local(ThresholdTables::standard(), inputs, inputs.age_hours(), false)
}

fn resolve_local(
    tables: &ThresholdTables,
    inputs: &BiliInputs,
    age_hours: f64,
    is_fallback: bool,
) -> BiliOutputs {
    let thresholds = local_thresholds(tables, inputs, age_hours);
    let out = BiliOutputs::from_thresholds(
        inputs,
        age_hours,
        thresholds,
        ThresholdSource::LocalTable,
        is_fallback,
    );

    tracing::info!(
        "Bilirubin thresholds from local tables: photo={:.1}, exchange={:.1}, delta={:.1}, fallback={}",
        out.photo_threshold,
        out.exchange_threshold,
        out.delta_to_photo,
        is_fallback
    );
    out
}

/// Service for bilirubin threshold calculations.
pub struct BiliService<T>
where
    T: ThresholdService,
{
    remote: Arc<T>,
    tables: &'static ThresholdTables,
    timeout: Duration,
}

impl<T> BiliService<T>
where
    T: ThresholdService,
{
    /// Create a new bilirubin service with the standard tables.
    pub fn new(remote: Arc<T>, timeout: Duration) -> Self {
        Self {
            remote,
            tables: ThresholdTables::standard(),
            timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Table-only calculation.
    #[must_use]
    pub fn calculate_local(&self, inputs: &BiliInputs) -> BiliOutputs {
        resolve_local(self.tables, inputs, inputs.age_hours(), false)
    }

    /// Resolve thresholds, consulting the remote service first when
    /// `use_remote` is set.
    ///
    /// Always returns well-formed outputs; `is_fallback` is set when the
    /// remote lookup was attempted and failed.
    pub async fn calculate(&self, inputs: &BiliInputs, use_remote: bool) -> BiliOutputs {
        let age_hours = inputs.age_hours();
        if !use_remote {
            return resolve_local(self.tables, inputs, age_hours, false);
        }

        let query = ThresholdQuery::from_inputs(inputs, age_hours);
        match tokio::time::timeout(self.timeout, self.remote.fetch_thresholds(&query)).await {
            Ok(Ok(thresholds)) => {
                let out = BiliOutputs::from_thresholds(
                    inputs,
                    age_hours,
                    thresholds,
                    ThresholdSource::Remote,
                    false,
                );
                tracing::info!(
                    "Bilirubin thresholds from remote service: photo={:.1}, exchange={:.1}, delta={:.1}",
                    out.photo_threshold,
                    out.exchange_threshold,
                    out.delta_to_photo
                );
                out
            }
            Ok(Err(e)) => {
                tracing::warn!("Remote threshold lookup failed, using local tables: {}", e);
                resolve_local(self.tables, inputs, age_hours, true)
            }
            Err(_) => {
                tracing::warn!(
                    "Remote threshold lookup exceeded {:?}, using local tables",
                    self.timeout
                );
                resolve_local(self.tables, inputs, age_hours, true)
            }
        }
    }
}
