//! BlueZ-backed beacon source (Linux only).
//!
//! Discovers nearby devices through the system Bluetooth daemon and
//! translates every advertisement carrying the target service UUID into a
//! [`BeaconSighting`]. The minor id is derived from the device address,
//! not decoded from manufacturer data; see
//! [`derive_minor_id`](crate::source::derive_minor_id).

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::source::{derive_minor_id, BeaconSource, SightingSink, SourceError};
use crate::types::BeaconSighting;

/// Beacon source scanning through the local BlueZ adapter.
pub struct BleSource {
    service_id: Uuid,
    task: Option<JoinHandle<()>>,
}

impl BleSource {
    /// Create a source filtering advertisements on `service_id`.
    #[must_use]
    pub const fn new(service_id: Uuid) -> Self {
        Self {
            service_id,
            task: None,
        }
    }
}

fn classify(kind: &bluer::ErrorKind, message: &str) -> SourceError {
    match kind {
        bluer::ErrorKind::NotAuthorized | bluer::ErrorKind::NotPermitted => {
            SourceError::PermissionDenied {
                message: message.to_string(),
            }
        }
        bluer::ErrorKind::NotReady => SourceError::AdapterPoweredOff,
        _ => SourceError::DiscoveryFailed {
            message: message.to_string(),
        },
    }
}

#[async_trait]
impl BeaconSource for BleSource {
    async fn activate(&mut self, sink: SightingSink) -> Result<(), SourceError> {
        if self.task.is_some() {
            return Ok(());
        }

        let session = bluer::Session::new()
            .await
            .map_err(|e| SourceError::DiscoveryFailed {
                message: format!("cannot reach bluetoothd: {e}"),
            })?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(|_| SourceError::AdapterNotFound)?;
        adapter
            .set_powered(true)
            .await
            .map_err(|_| SourceError::AdapterPoweredOff)?;

        info!(adapter = %adapter.name(), "starting BlueZ discovery");

        // Discovery starts inside the scan task (the event stream borrows
        // the adapter); the oneshot reports whether it came up.
        let service_id = self.service_id;
        let (ready_tx, ready_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let discover = match adapter.discover_devices().await {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(classify(&e.kind, &e.message)));
                    return;
                }
            };
            tokio::pin!(discover);

            while let Some(event) = discover.next().await {
                let bluer::AdapterEvent::DeviceAdded(addr) = event else {
                    continue;
                };
                let Ok(device) = adapter.device(addr) else {
                    continue;
                };

                let uuids = device.uuids().await.ok().flatten().unwrap_or_default();
                if !uuids.contains(&service_id) {
                    continue;
                }

                let Some(rssi) = device.rssi().await.ok().flatten() else {
                    debug!(%addr, "matching device without RSSI, skipping");
                    continue;
                };

                let sighting = BeaconSighting {
                    service_id,
                    minor_id: derive_minor_id(&addr.to_string()),
                    signal_strength_dbm: rssi,
                    observed_at_utc: Utc::now(),
                };
                debug!(%addr, minor_id = sighting.minor_id, rssi, "beacon sighted");

                if !sink.send(sighting) {
                    break;
                }
            }
            warn!("BlueZ discovery stream ended");
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                self.task = Some(task);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SourceError::DiscoveryFailed {
                message: "discovery task exited before starting".to_string(),
            }),
        }
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

impl Drop for BleSource {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
