//! Detection coordinator: scanner state machine and event log.
//!
//! The coordinator owns the scanner lifecycle (`Idle → Scanning →
//! Detected → Scanning`, with `Error` on activation failure), consumes
//! sightings from the active [`BeaconSource`], enriches them with a
//! location fix, appends them to the newest-first event log, and decides
//! when to request advisory text.
//!
//! All state lives behind a single `RwLock`; every read-modify-write
//! sequence happens under it. Sightings are sequenced by one dispatch task
//! in arrival order, while enrichment (location fetch, advisory request)
//! runs in spawned tasks and may complete out of order — the log insert
//! position is determined by the arrival sequence, never by completion
//! order. A generation counter bumped on every start/stop invalidates
//! settle timers and in-flight enrichment from ended sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::advisory::{advisory_context, AdvisoryPolicy, AdvisoryService, FALLBACK_ADVISORY};
use crate::location::LocationProvider;
use crate::source::{BeaconSource, SightingSink, SourceError};
use crate::types::{BeaconSighting, DetectionEvent, ScannerState};

/// Owner of scanner state, the detection log, and the advisory message.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct DetectionCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    inner: RwLock<Inner>,
    location: Arc<dyn LocationProvider>,
    advisory: Arc<dyn AdvisoryService>,
    policy: Arc<dyn AdvisoryPolicy>,
    timezone: Tz,
    settle_delay: Duration,
}

struct Inner {
    state: ScannerState,
    events: Vec<DetectionEvent>,
    advisory_message: Option<String>,
    source: Option<Box<dyn BeaconSource>>,
    /// Bumped on every start and stop; tasks carrying an older generation
    /// must drop their results.
    generation: u64,
    next_sequence: u64,
    settle: Option<JoinHandle<()>>,
    dispatch: Option<JoinHandle<()>>,
}

impl DetectionCoordinator {
    /// Create a coordinator with injected collaborators.
    #[must_use]
    pub fn new(
        location: Arc<dyn LocationProvider>,
        advisory: Arc<dyn AdvisoryService>,
        policy: Arc<dyn AdvisoryPolicy>,
        timezone: Tz,
        settle_delay: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: RwLock::new(Inner {
                    state: ScannerState::Idle,
                    events: Vec::new(),
                    advisory_message: None,
                    source: None,
                    generation: 0,
                    next_sequence: 0,
                    settle: None,
                    dispatch: None,
                }),
                location,
                advisory,
                policy,
                timezone,
                settle_delay,
            }),
        }
    }

    /// Start scanning with `source`.
    ///
    /// No-op when the scanner is already non-idle: a source is never
    /// activated twice. On activation failure the scanner enters
    /// [`ScannerState::Error`], from which only [`stop`](Self::stop)
    /// (reset) leads back to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns the [`SourceError`] when activation fails.
    pub async fn start(&self, mut source: Box<dyn BeaconSource>) -> Result<(), SourceError> {
        let mut inner = self.shared.inner.write().await;
        if inner.state != ScannerState::Idle {
            debug!(state = ?inner.state, "start ignored, scanner already active");
            return Ok(());
        }

        inner.generation += 1;
        let generation = inner.generation;
        let (sink, rx) = SightingSink::channel();

        match source.activate(sink).await {
            Ok(()) => {
                inner.source = Some(source);
                inner.state = ScannerState::Scanning;
                inner.dispatch = Some(tokio::spawn(run_dispatch(
                    Arc::clone(&self.shared),
                    rx,
                    generation,
                )));
                info!(generation, "scanner started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "beacon source activation failed");
                inner.state = ScannerState::Error;
                Err(e)
            }
        }
    }

    /// Stop scanning and return to `Idle` from any state.
    ///
    /// Deactivates the source, cancels the settle timer and the dispatch
    /// loop, and clears any visible advisory. Safe to call repeatedly,
    /// including while already idle. The event log is kept.
    pub async fn stop(&self) {
        let (source, settle, dispatch) = {
            let mut inner = self.shared.inner.write().await;
            if inner.state == ScannerState::Idle {
                debug!("stop ignored, scanner already idle");
                return;
            }
            inner.generation += 1;
            inner.state = ScannerState::Idle;
            inner.advisory_message = None;
            (
                inner.source.take(),
                inner.settle.take(),
                inner.dispatch.take(),
            )
        };

        if let Some(handle) = settle {
            handle.abort();
        }
        if let Some(handle) = dispatch {
            handle.abort();
        }
        if let Some(mut source) = source {
            source.deactivate().await;
        }
        info!("scanner stopped");
    }

    /// Current scanner state.
    pub async fn state(&self) -> ScannerState {
        self.shared.inner.read().await.state
    }

    /// Snapshot of the event log, newest first.
    pub async fn events(&self) -> Vec<DetectionEvent> {
        self.shared.inner.read().await.events.clone()
    }

    /// Number of recorded detections.
    pub async fn detection_count(&self) -> usize {
        self.shared.inner.read().await.events.len()
    }

    /// The currently visible advisory text, if any.
    pub async fn advisory_message(&self) -> Option<String> {
        self.shared.inner.read().await.advisory_message.clone()
    }

    /// Dismiss the currently visible advisory.
    pub async fn dismiss_advisory(&self) {
        self.shared.inner.write().await.advisory_message = None;
    }
}

/// Consume sightings in arrival order for one scanner session.
async fn run_dispatch(
    shared: Arc<Shared>,
    mut rx: mpsc::UnboundedReceiver<BeaconSighting>,
    generation: u64,
) {
    while let Some(sighting) = rx.recv().await {
        let sequence = {
            let mut inner = shared.inner.write().await;
            // A stale generation means the session ended between emission
            // and delivery; the sighting is dropped without a trace.
            if inner.generation != generation {
                debug!("dropping sighting from ended session");
                return;
            }

            inner.state = ScannerState::Detected;
            inner.next_sequence += 1;

            // Re-arm the settle timer; overlapping settle transitions are
            // not allowed.
            if let Some(prev) = inner.settle.take() {
                prev.abort();
            }
            inner.settle = Some(tokio::spawn(run_settle(Arc::clone(&shared), generation)));
            inner.next_sequence
        };

        debug!(
            sequence,
            minor_id = sighting.minor_id,
            rssi = sighting.signal_strength_dbm,
            "sighting received"
        );
        tokio::spawn(enrich(Arc::clone(&shared), sighting, sequence, generation));
    }
}

/// Return the scanner to `Scanning` once the settle delay elapses.
async fn run_settle(shared: Arc<Shared>, generation: u64) {
    tokio::time::sleep(shared.settle_delay).await;
    let mut inner = shared.inner.write().await;
    if inner.generation == generation && inner.state == ScannerState::Detected {
        inner.state = ScannerState::Scanning;
        debug!("settled back to scanning");
    }
}

/// Attach a location fix, record the event, and maybe request advice.
async fn enrich(shared: Arc<Shared>, sighting: BeaconSighting, sequence: u64, generation: u64) {
    let location = match shared.location.current_location().await {
        Ok(fix) => Some(fix),
        Err(e) => {
            warn!(error = %e, "location fix failed, recording event without location");
            None
        }
    };

    let event = DetectionEvent::new(sequence, sighting, location);
    let request_advice = {
        let mut inner = shared.inner.write().await;
        if inner.generation != generation {
            debug!(sequence, "dropping enrichment from ended session");
            return;
        }

        // Insert at the arrival-order position: the log stays newest-first
        // by sequence even when an earlier sighting's fix resolves later.
        let position = inner
            .events
            .iter()
            .position(|e| e.sequence < sequence)
            .unwrap_or(inner.events.len());
        inner.events.insert(position, event.clone());
        info!(
            sequence,
            minor_id = event.sighting.minor_id,
            has_location = event.location.is_some(),
            "detection recorded"
        );

        shared.policy.should_request(&event)
    };

    if !request_advice {
        return;
    }

    let context = advisory_context(&event, shared.timezone);
    let text = match shared.advisory.safety_advice(&context).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "advisory request failed, using fallback text");
            FALLBACK_ADVISORY.to_string()
        }
    };

    let mut inner = shared.inner.write().await;
    if inner.generation == generation {
        inner.advisory_message = Some(text);
    } else {
        debug!(sequence, "dropping advisory from ended session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::AdvisoryError;
    use crate::location::{FixedLocationProvider, LocationError, UnavailableLocationProvider};
    use crate::types::LocationFix;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    const SETTLE: Duration = Duration::from_millis(2000);

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    /// Source controlled by the test: sightings are pushed through a
    /// handle onto the sink captured at activation.
    #[derive(Clone, Default)]
    struct ManualSource {
        sink: Arc<Mutex<Option<SightingSink>>>,
        activations: Arc<AtomicUsize>,
    }

    impl ManualSource {
        fn emit(&self, minor_id: u16, rssi: i16) -> bool {
            let sink = self.sink.lock().unwrap().clone();
            sink.is_some_and(|sink| {
                sink.send(BeaconSighting {
                    service_id: Uuid::nil(),
                    minor_id,
                    signal_strength_dbm: rssi,
                    observed_at_utc: Utc::now(),
                })
            })
        }

        fn captured_sink(&self) -> Option<SightingSink> {
            self.sink.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BeaconSource for ManualSource {
        async fn activate(&mut self, sink: SightingSink) -> Result<(), SourceError> {
            self.activations.fetch_add(1, Ordering::SeqCst);
            *self.sink.lock().unwrap() = Some(sink);
            Ok(())
        }

        async fn deactivate(&mut self) {
            self.sink.lock().unwrap().take();
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BeaconSource for FailingSource {
        async fn activate(&mut self, _sink: SightingSink) -> Result<(), SourceError> {
            Err(SourceError::AdapterNotFound)
        }

        async fn deactivate(&mut self) {}
    }

    /// Location provider resolving after a scripted per-call delay.
    struct DelayedLocation {
        fix: LocationFix,
        delays_ms: Mutex<VecDeque<u64>>,
    }

    #[async_trait]
    impl LocationProvider for DelayedLocation {
        async fn current_location(&self) -> Result<LocationFix, LocationError> {
            let delay = self.delays_ms.lock().unwrap().pop_front().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(self.fix)
        }
    }

    #[derive(Default)]
    struct RecordingAdvisory {
        contexts: Mutex<Vec<String>>,
        fail: bool,
        delay_ms: u64,
    }

    #[async_trait]
    impl AdvisoryService for RecordingAdvisory {
        async fn safety_advice(&self, context: &str) -> Result<String, AdvisoryError> {
            self.contexts.lock().unwrap().push(context.to_string());
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                Err(AdvisoryError::RequestFailed {
                    message: "scripted failure".to_string(),
                })
            } else {
                Ok(format!("consejo #{}", self.contexts.lock().unwrap().len()))
            }
        }
    }

    struct AlwaysPolicy;
    impl AdvisoryPolicy for AlwaysPolicy {
        fn should_request(&self, _event: &DetectionEvent) -> bool {
            true
        }
    }

    struct NeverPolicy;
    impl AdvisoryPolicy for NeverPolicy {
        fn should_request(&self, _event: &DetectionEvent) -> bool {
            false
        }
    }

    fn fix(latitude: f64, longitude: f64) -> LocationFix {
        LocationFix {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }

    fn coordinator_with(
        location: Arc<dyn LocationProvider>,
        advisory: Arc<dyn AdvisoryService>,
        policy: Arc<dyn AdvisoryPolicy>,
    ) -> DetectionCoordinator {
        DetectionCoordinator::new(location, advisory, policy, chrono_tz::UTC, SETTLE)
    }

    fn quiet_coordinator() -> DetectionCoordinator {
        coordinator_with(
            Arc::new(FixedLocationProvider::new(fix(40.0, -3.0))),
            Arc::new(RecordingAdvisory::default()),
            Arc::new(NeverPolicy),
        )
    }

    /// Let spawned dispatch/enrichment tasks run to completion.
    async fn drain() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // ------------------------------------------------------------------
    // State machine invariants
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_idle_is_a_noop() {
        let coordinator = quiet_coordinator();
        coordinator.stop().await;
        coordinator.stop().await;
        assert_eq!(coordinator.state().await, ScannerState::Idle);
        assert!(coordinator.events().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_active_does_not_activate_a_second_source() {
        let coordinator = quiet_coordinator();
        let first = ManualSource::default();
        let second = ManualSource::default();

        coordinator.start(Box::new(first.clone())).await.unwrap();
        coordinator.start(Box::new(second.clone())).await.unwrap();

        assert_eq!(first.activations.load(Ordering::SeqCst), 1);
        assert_eq!(second.activations.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.state().await, ScannerState::Scanning);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_is_ordered_newest_first_by_arrival() {
        let coordinator = quiet_coordinator();
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        for minor in [1001, 1002, 1003, 1004, 1005] {
            assert!(source.emit(minor, -60));
            drain().await;
        }

        let events = coordinator.events().await;
        assert_eq!(events.len(), 5);
        let minors: Vec<u16> = events.iter().map(|e| e.sighting.minor_id).collect();
        assert_eq!(minors, vec![1005, 1004, 1003, 1002, 1001]);
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![5, 4, 3, 2, 1]);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_location_provider_yields_events_without_location() {
        let coordinator = coordinator_with(
            Arc::new(UnavailableLocationProvider),
            Arc::new(RecordingAdvisory::default()),
            Arc::new(NeverPolicy),
        );
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;

        let events = coordinator.events().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].location.is_none());
        // The failure never reaches the state machine.
        assert_eq!(coordinator.state().await, ScannerState::Detected);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_back_to_scanning_after_the_delay() {
        let coordinator = quiet_coordinator();
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;
        assert_eq!(coordinator.state().await, ScannerState::Detected);

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(coordinator.state().await, ScannerState::Detected);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(coordinator.state().await, ScannerState::Scanning);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_the_settle_delay_stays_idle() {
        let coordinator = quiet_coordinator();
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;
        assert_eq!(coordinator.state().await, ScannerState::Detected);

        coordinator.stop().await;
        assert_eq!(coordinator.state().await, ScannerState::Idle);

        // The cancelled settle timer must not resurrect `Scanning`.
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(coordinator.state().await, ScannerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sighting_delivered_after_stop_is_dropped() {
        let coordinator = quiet_coordinator();
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        let stale_sink = source.captured_sink().unwrap();
        coordinator.stop().await;

        stale_sink.send(BeaconSighting {
            service_id: Uuid::nil(),
            minor_id: 4242,
            signal_strength_dbm: -60,
            observed_at_utc: Utc::now(),
        });
        drain().await;

        assert_eq!(coordinator.state().await, ScannerState::Idle);
        assert!(coordinator.events().await.is_empty());
    }

    // ------------------------------------------------------------------
    // End-to-end flows
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_single_detection_with_location() {
        let coordinator = quiet_coordinator();
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;

        let events = coordinator.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sighting.minor_id, 4242);
        assert_eq!(events[0].sighting.signal_strength_dbm, -60);
        let location = events[0].location.unwrap();
        assert!((location.latitude - 40.0).abs() < f64::EPSILON);
        assert!((location.longitude - -3.0).abs() < f64::EPSILON);
        assert_eq!(events[0].sync_status, crate::types::SyncStatus::Synced);

        assert_eq!(coordinator.state().await, ScannerState::Detected);
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(coordinator.state().await, ScannerState::Scanning);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_failure_enters_error_state() {
        let coordinator = quiet_coordinator();

        let err = coordinator.start(Box::new(FailingSource)).await.unwrap_err();
        assert!(matches!(err, SourceError::AdapterNotFound));
        assert_eq!(coordinator.state().await, ScannerState::Error);
        assert!(coordinator.events().await.is_empty());

        // Starting again while in `Error` is a no-op; only a reset helps.
        let other = ManualSource::default();
        coordinator.start(Box::new(other.clone())).await.unwrap();
        assert_eq!(other.activations.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.state().await, ScannerState::Error);

        coordinator.stop().await;
        assert_eq!(coordinator.state().await, ScannerState::Idle);
        coordinator.start(Box::new(other.clone())).await.unwrap();
        assert_eq!(coordinator.state().await, ScannerState::Scanning);
        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_enrichment_keeps_arrival_order() {
        // First fix resolves after 500 ms, second after 50 ms.
        let location = DelayedLocation {
            fix: fix(40.0, -3.0),
            delays_ms: Mutex::new(VecDeque::from([500, 50])),
        };
        let coordinator = coordinator_with(
            Arc::new(location),
            Arc::new(RecordingAdvisory::default()),
            Arc::new(NeverPolicy),
        );
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(1, -60);
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.emit(2, -70);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let events = coordinator.events().await;
        assert_eq!(events.len(), 2);
        // Arrival order wins even though the second fix completed first.
        assert_eq!(events[0].sighting.minor_id, 2);
        assert_eq!(events[1].sighting.minor_id, 1);
        assert!(events[0].location.is_some());
        assert!(events[1].location.is_some());

        coordinator.stop().await;
    }

    // ------------------------------------------------------------------
    // Advisory lifecycle
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_advisory_is_shown_and_replaced() {
        let advisory = Arc::new(RecordingAdvisory::default());
        let coordinator = coordinator_with(
            Arc::new(FixedLocationProvider::new(fix(40.0, -3.0))),
            Arc::clone(&advisory) as Arc<dyn AdvisoryService>,
            Arc::new(AlwaysPolicy),
        );
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(1111, -60);
        drain().await;
        assert_eq!(
            coordinator.advisory_message().await.as_deref(),
            Some("consejo #1")
        );

        source.emit(2222, -60);
        drain().await;
        assert_eq!(
            coordinator.advisory_message().await.as_deref(),
            Some("consejo #2")
        );

        let context = advisory.contexts.lock().unwrap().last().unwrap().clone();
        assert!(context.contains("Pet Beacon ID 2222"));

        coordinator.dismiss_advisory().await;
        assert!(coordinator.advisory_message().await.is_none());

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_failure_shows_fallback_text() {
        let coordinator = coordinator_with(
            Arc::new(FixedLocationProvider::new(fix(40.0, -3.0))),
            Arc::new(RecordingAdvisory {
                fail: true,
                ..RecordingAdvisory::default()
            }),
            Arc::new(AlwaysPolicy),
        );
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;

        assert_eq!(
            coordinator.advisory_message().await.as_deref(),
            Some(FALLBACK_ADVISORY)
        );
        // The failure is absorbed; the scanner keeps running.
        assert_eq!(coordinator.state().await, ScannerState::Detected);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_is_never_requested_when_the_policy_declines() {
        let advisory = Arc::new(RecordingAdvisory::default());
        let coordinator = coordinator_with(
            Arc::new(FixedLocationProvider::new(fix(40.0, -3.0))),
            Arc::clone(&advisory) as Arc<dyn AdvisoryService>,
            Arc::new(NeverPolicy),
        );
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;

        assert!(coordinator.advisory_message().await.is_none());
        assert!(advisory.contexts.lock().unwrap().is_empty());

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_resolving_after_stop_is_not_shown() {
        let coordinator = coordinator_with(
            Arc::new(FixedLocationProvider::new(fix(40.0, -3.0))),
            Arc::new(RecordingAdvisory {
                delay_ms: 500,
                ..RecordingAdvisory::default()
            }),
            Arc::new(AlwaysPolicy),
        );
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;
        // Stop while the advisory request is still in flight.
        coordinator.stop().await;

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(coordinator.advisory_message().await.is_none());
        assert_eq!(coordinator.state().await, ScannerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_the_advisory_but_keeps_the_log() {
        let coordinator = coordinator_with(
            Arc::new(FixedLocationProvider::new(fix(40.0, -3.0))),
            Arc::new(RecordingAdvisory::default()),
            Arc::new(AlwaysPolicy),
        );
        let source = ManualSource::default();
        coordinator.start(Box::new(source.clone())).await.unwrap();

        source.emit(4242, -60);
        drain().await;
        assert!(coordinator.advisory_message().await.is_some());

        coordinator.stop().await;
        assert!(coordinator.advisory_message().await.is_none());
        assert_eq!(coordinator.detection_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_continues_the_event_sequence() {
        let coordinator = quiet_coordinator();
        let source = ManualSource::default();

        coordinator.start(Box::new(source.clone())).await.unwrap();
        source.emit(1001, -60);
        drain().await;
        coordinator.stop().await;

        coordinator.start(Box::new(source.clone())).await.unwrap();
        source.emit(1002, -60);
        drain().await;

        let events = coordinator.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sighting.minor_id, 1002);
        assert!(events[0].sequence > events[1].sequence);

        coordinator.stop().await;
    }
}
