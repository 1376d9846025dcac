//! Simulated beacon source.
//!
//! Manufactures synthetic sightings at randomized intervals so the
//! coordinator can be exercised without Bluetooth hardware. This is the
//! default source for the demo node.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::source::{BeaconSource, SightingSink, SourceError};
use crate::types::BeaconSighting;

/// Timer-driven source emitting randomized sightings.
///
/// Each emission waits a uniformly random delay inside the configured
/// interval window, then delivers a sighting with a random minor id and
/// signal strength. Deactivation aborts the emission task, so no sighting
/// is delivered after it returns.
pub struct SimulatedSource {
    service_id: Uuid,
    config: SimulationConfig,
    seed: Option<u64>,
    task: Option<JoinHandle<()>>,
}

impl SimulatedSource {
    /// Create a source emitting sightings for `service_id`.
    #[must_use]
    pub const fn new(service_id: Uuid, config: SimulationConfig) -> Self {
        Self {
            service_id,
            config,
            seed: None,
            task: None,
        }
    }

    /// Create a source with a deterministic emission schedule for tests.
    #[must_use]
    pub const fn seeded(service_id: Uuid, config: SimulationConfig, seed: u64) -> Self {
        Self {
            service_id,
            config,
            seed: Some(seed),
            task: None,
        }
    }
}

#[async_trait]
impl BeaconSource for SimulatedSource {
    async fn activate(&mut self, sink: SightingSink) -> Result<(), SourceError> {
        if self.task.is_some() {
            return Ok(());
        }

        let service_id = self.service_id;
        let config = self.config.clone();
        let mut rng = self
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        self.task = Some(tokio::spawn(async move {
            loop {
                let delay_ms = rng.gen_range(config.min_interval_ms..=config.max_interval_ms);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                let sighting = BeaconSighting {
                    service_id,
                    minor_id: rng.gen_range(config.min_minor_id..=config.max_minor_id),
                    signal_strength_dbm: rng
                        .gen_range(config.min_rssi_dbm..=config.max_rssi_dbm),
                    observed_at_utc: Utc::now(),
                };
                debug!(minor_id = sighting.minor_id, rssi = sighting.signal_strength_dbm,
                    "emitting simulated sighting");

                if !sink.send(sighting) {
                    break;
                }
            }
        }));

        Ok(())
    }

    async fn deactivate(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Wait out a poll already past its sleep; once the handle
            // resolves, the task and its sink clone are gone.
            let _ = task.await;
        }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
