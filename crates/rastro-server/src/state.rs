//! Application state shared across handlers.

use std::sync::Arc;

use rastro_core::{
    BeaconSource, Config, DetectionCoordinator, FixedLocationProvider, GeminiClient,
    LocationProvider, RandomPolicy, SimulatedSource, SourceError, UnavailableLocationProvider,
};
use tracing::{info, warn};

/// Which kind of beacon source the scanner is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Timer-driven simulated sightings.
    Simulated,
    /// BlueZ advertisement scanning.
    Bluetooth,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    coordinator: DetectionCoordinator,
    source_kind: std::sync::Mutex<SourceKind>,
}

impl AppState {
    /// Create application state from the default configuration path.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing configuration file cannot be read,
    /// parsed, or validated.
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::load_or_default()?;
        Ok(Self::from_config(config))
    }

    /// Create application state from an already-loaded configuration,
    /// wiring up the coordinator and its collaborators.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let location: Arc<dyn LocationProvider> = match config.location.fix() {
            Some(fix) => Arc::new(FixedLocationProvider::new(fix)),
            None => Arc::new(UnavailableLocationProvider),
        };
        let advisory = Arc::new(GeminiClient::new(
            config.advisory.model.clone(),
            config.advisory.api_key.clone(),
        ));
        let policy = Arc::new(RandomPolicy::new(config.advisory.probability));

        let coordinator = DetectionCoordinator::new(
            location,
            advisory,
            policy,
            config.advisory.timezone,
            config.scanner.settle_delay(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                coordinator,
                source_kind: std::sync::Mutex::new(SourceKind::Simulated),
            }),
        }
    }

    /// The loaded configuration. Immutable after startup.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The detection coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &DetectionCoordinator {
        &self.inner.coordinator
    }

    /// The kind of source the most recent start used.
    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        *self.inner.source_kind.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_source_kind(&self, kind: SourceKind) {
        *self
            .inner
            .source_kind
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = kind;
    }

    /// Start the scanner with the configured source.
    ///
    /// Picks the simulated source when configured (or when the binary is
    /// built without Bluetooth support), otherwise scans via BlueZ. When
    /// BlueZ activation fails and `fallback_to_simulation` is set, the
    /// error state is reset and the simulated source takes over.
    ///
    /// Returns the kind of source that ended up driving the scanner.
    ///
    /// # Errors
    ///
    /// Returns the activation [`SourceError`] when no usable source could
    /// be started.
    pub async fn start_scanner(&self) -> Result<SourceKind, SourceError> {
        let scanner = &self.inner.config.scanner;

        if self.use_bluetooth() {
            match self
                .inner
                .coordinator
                .start(self.bluetooth_source())
                .await
            {
                Ok(()) => {
                    self.set_source_kind(SourceKind::Bluetooth);
                    return Ok(SourceKind::Bluetooth);
                }
                Err(e) if scanner.fallback_to_simulation => {
                    warn!(error = %e, "bluetooth activation failed, falling back to simulation");
                    // Leave the error state before retrying.
                    self.inner.coordinator.stop().await;
                }
                Err(e) => return Err(e),
            }
        }

        self.inner.coordinator.start(self.simulated_source()).await?;
        self.set_source_kind(SourceKind::Simulated);
        info!("scanner running on simulated source");
        Ok(SourceKind::Simulated)
    }

    fn use_bluetooth(&self) -> bool {
        cfg!(feature = "bluetooth") && !self.inner.config.scanner.use_simulation
    }

    fn simulated_source(&self) -> Box<dyn BeaconSource> {
        Box::new(SimulatedSource::new(
            self.inner.config.scanner.target_service_uuid,
            self.inner.config.simulation.clone(),
        ))
    }

    #[cfg(feature = "bluetooth")]
    fn bluetooth_source(&self) -> Box<dyn BeaconSource> {
        Box::new(rastro_core::BleSource::new(
            self.inner.config.scanner.target_service_uuid,
        ))
    }

    #[cfg(not(feature = "bluetooth"))]
    fn bluetooth_source(&self) -> Box<dyn BeaconSource> {
        // Unreachable: `use_bluetooth` is always false without the feature.
        self.simulated_source()
    }
}
