//! Generation-tracked bilirubin requests.
//!
//! Every submission takes a new generation from [`GenerationCounter`].
//! Results travel back over a channel and are applied only if their generation
//! is still the latest one issued, so a slow remote lookup can never replace a
//! newer result. Superseded tasks keep running; their output is discarded on
//! arrival.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::bili::BiliService;
use crate::domain::{BiliInputs, BiliOutputs};
use crate::ports::ThresholdService;

/// Tag carried by each submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestGeneration(u64);

impl RequestGeneration {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic generation source.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: AtomicU64,
}

impl GenerationCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next generation. It becomes the latest immediately.
    pub fn next(&self) -> RequestGeneration {
        RequestGeneration(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[must_use]
    pub fn latest(&self) -> RequestGeneration {
        RequestGeneration(self.latest.load(Ordering::SeqCst))
    }

    #[must_use]
    pub fn is_current(&self, generation: RequestGeneration) -> bool {
        self.latest() == generation
    }
}

type Completed = (RequestGeneration, BiliOutputs);

/// Holds the most recent bilirubin result for one screen or caller.
///
/// Must be used from within a Tokio runtime.
pub struct BiliSession<T>
where
    T: ThresholdService + 'static,
{
    service: Arc<BiliService<T>>,
    generations: GenerationCounter,
    tx: UnboundedSender<Completed>,
    rx: UnboundedReceiver<Completed>,
    pending: Vec<JoinHandle<()>>,
    current: Option<Completed>,
}

impl<T> BiliSession<T>
where
    T: ThresholdService + 'static,
{
    pub fn new(service: Arc<BiliService<T>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            generations: GenerationCounter::new(),
            tx,
            rx,
            pending: Vec::new(),
            current: None,
        }
    }

    /// Compute from the local tables and apply the result immediately.
    pub fn submit_local(&mut self, inputs: &BiliInputs) -> RequestGeneration {
        let generation = self.generations.next();
        let out = self.service.calculate_local(inputs);
        self.current = Some((generation, out));
        generation
    }

    /// Start a calculation in the background. The result is applied by a later
    /// [`poll`](Self::poll) or [`settle`](Self::settle) if nothing newer has
    /// been submitted in the meantime.
    pub fn submit(&mut self, inputs: BiliInputs, use_remote: bool) -> RequestGeneration {
        let generation = self.generations.next();
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();

        self.pending.retain(|handle| !handle.is_finished());
        self.pending.push(tokio::spawn(async move {
            let out = service.calculate(&inputs, use_remote).await;
            // Receiver dropped means the session is gone.
            let _ = tx.send((generation, out));
        }));

        tracing::debug!("Submitted bilirubin request {}", generation.value());
        generation
    }

    /// Apply any results that have arrived. Returns `true` if the current
    /// result changed.
    pub fn poll(&mut self) -> bool {
        let mut updated = false;
        while let Ok((generation, out)) = self.rx.try_recv() {
            if self.generations.is_current(generation) {
                self.current = Some((generation, out));
                updated = true;
            } else {
                tracing::debug!(
                    "Discarding stale bilirubin result {} (latest {})",
                    generation.value(),
                    self.generations.latest().value()
                );
            }
        }
        updated
    }

    /// Wait for every outstanding request, then apply what arrived.
    pub async fn settle(&mut self) -> bool {
        for handle in self.pending.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("Bilirubin request task failed: {}", e);
            }
        }
        self.poll()
    }

    #[must_use]
    pub fn current(&self) -> Option<&BiliOutputs> {
        self.current.as_ref().map(|(_, out)| out)
    }

    #[must_use]
    pub fn current_generation(&self) -> Option<RequestGeneration> {
        self.current.as_ref().map(|(generation, _)| *generation)
    }

    #[must_use]
    pub fn latest_generation(&self) -> RequestGeneration {
        self.generations.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeThresholdService;
    use crate::domain::{GestationalAge, ThresholdSource, Thresholds};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::time::Duration;

    fn inputs(tsb: f64) -> BiliInputs {
        let birth = Utc
            .with_ymd_and_hms(2026, 2, 14, 6, 30, 0)
            .single()
            .expect("Valid timestamp");
        BiliInputs {
            gestational_age: GestationalAge::new(39, 3),
            birth_time: birth,
            sample_time: birth + ChronoDuration::hours(24),
            tsb,
            neurotoxicity_risk: false,
        }
    }

    fn session(delay: Duration) -> BiliSession<FakeThresholdService> {
        let fake = FakeThresholdService::succeeding(Thresholds {
            photo: 9.0,
            exchange: 18.0,
        })
        .with_delay(delay);
        let service = BiliService::new(Arc::new(fake), Duration::from_secs(2));
        BiliSession::new(Arc::new(service))
    }

    #[test]
    fn test_generation_counter_is_monotonic() {
        let counter = GenerationCounter::new();
        let a = counter.next();
        let b = counter.next();
        assert!(b > a);
        assert!(counter.is_current(b));
        assert!(!counter.is_current(a));
        assert_eq!(counter.latest(), b);
    }

    #[tokio::test]
    async fn test_remote_result_applied_when_current() {
        let mut session = session(Duration::ZERO);
        let generation = session.submit(inputs(8.0), true);

        assert!(session.settle().await);
        let current = session.current().expect("Should have a result");
        assert_eq!(current.source, ThresholdSource::Remote);
        assert_eq!(session.current_generation(), Some(generation));
    }

    #[tokio::test]
    async fn test_stale_remote_does_not_overwrite_newer_local() {
        let mut session = session(Duration::from_millis(100));
        let remote = session.submit(inputs(8.0), true);
        let local = session.submit_local(&inputs(10.0));
        assert!(local > remote);

        assert!(!session.settle().await);
        let current = session.current().expect("Should have a result");
        assert_eq!(current.source, ThresholdSource::LocalTable);
        assert!(!current.is_fallback);
        assert_eq!(session.current_generation(), Some(local));
    }

    #[tokio::test]
    async fn test_only_latest_of_overlapping_requests_applies() {
        let mut session = session(Duration::from_millis(20));
        let _first = session.submit(inputs(8.0), true);
        let second = session.submit(inputs(11.0), true);

        session.settle().await;
        let current = session.current().expect("Should have a result");
        assert_eq!(session.current_generation(), Some(second));
        assert!((current.delta_to_photo - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_poll_without_results_is_noop() {
        let mut session = session(Duration::ZERO);
        assert!(!session.poll());
        assert!(session.current().is_none());
    }
}
