//! In-memory threshold service for use-case tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::Thresholds;
use crate::ports::{ThresholdQuery, ThresholdService, ThresholdServiceError};

pub(crate) struct FakeThresholdService {
    result: Result<Thresholds, ThresholdServiceError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeThresholdService {
    pub(crate) fn succeeding(thresholds: Thresholds) -> Self {
        Self {
            result: Ok(thresholds),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(error: ThresholdServiceError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ThresholdService for FakeThresholdService {
    async fn fetch_thresholds(
        &self,
        _query: &ThresholdQuery,
    ) -> Result<Thresholds, ThresholdServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}
